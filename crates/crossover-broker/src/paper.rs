//! In-memory paper broker for offline dry runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crossover_core::error::{BrokerError, DataError};
use crossover_core::traits::{Broker, MarketData};
use crossover_core::types::{
    AccountSnapshot, OrderConfirmation, OrderRequest, Position, PriceHistory, Side,
};

#[derive(Debug)]
struct PaperAccount {
    cash: Decimal,
    /// Open positions in the order they were opened
    positions: Vec<Position>,
    /// Last known close per symbol
    marks: HashMap<String, Decimal>,
    orders: Vec<OrderConfirmation>,
}

impl PaperAccount {
    fn portfolio_value(&self) -> Decimal {
        self.cash
            + self
                .positions
                .iter()
                .map(|p| {
                    let mark = self.marks.get(&p.symbol).copied().unwrap_or(p.entry_price);
                    mark * Decimal::from(p.quantity)
                })
                .sum::<Decimal>()
    }
}

/// Paper broker that fills market orders immediately at the latest close.
///
/// The session is always open. Price history is served from an injected
/// source, and every history served updates the marks used for valuation.
pub struct PaperBroker {
    account: Arc<Mutex<PaperAccount>>,
    source: Arc<dyn MarketData>,
    history_days: u32,
}

impl PaperBroker {
    /// Create a new paper broker with starting cash.
    pub fn new(initial_cash: Decimal, source: Arc<dyn MarketData>) -> Self {
        Self {
            account: Arc::new(Mutex::new(PaperAccount {
                cash: initial_cash,
                positions: Vec::new(),
                marks: HashMap::new(),
                orders: Vec::new(),
            })),
            source,
            history_days: 300,
        }
    }

    /// Calendar days requested from the source when pricing a fill.
    pub fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days;
        self
    }

    /// Seed an existing position.
    pub async fn with_position(self, position: Position) -> Self {
        self.account.lock().await.positions.push(position);
        self
    }

    /// Orders filled so far.
    pub async fn orders(&self) -> Vec<OrderConfirmation> {
        self.account.lock().await.orders.clone()
    }

    async fn last_close(&self, symbol: &str) -> Result<Decimal, BrokerError> {
        let history = self
            .source
            .fetch_price_history(symbol, self.history_days)
            .await
            .map_err(|e| BrokerError::OrderRejected(format!("no price for {}: {}", symbol, e)))?;
        history
            .last_close_decimal()
            .ok_or_else(|| BrokerError::OrderRejected(format!("no valid close for {}", symbol)))
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn get_account(&self) -> Result<AccountSnapshot, BrokerError> {
        let account = self.account.lock().await;
        Ok(AccountSnapshot::new(account.cash, account.portfolio_value()))
    }

    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError> {
        let account = self.account.lock().await;
        Ok(account
            .positions
            .iter()
            .map(|p| match account.marks.get(&p.symbol) {
                Some(mark) => p.clone().with_current_price(*mark),
                None => p.clone(),
            })
            .collect())
    }

    async fn is_market_open(&self) -> Result<bool, BrokerError> {
        Ok(true) // Paper trading is always open
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<OrderConfirmation, BrokerError> {
        if request.quantity == 0 {
            return Err(BrokerError::OrderRejected("quantity must be positive".into()));
        }
        let price = self.last_close(&request.symbol).await?;
        let value = price * Decimal::from(request.quantity);

        let mut account = self.account.lock().await;
        let existing = account
            .positions
            .iter()
            .position(|p| p.symbol == request.symbol);

        match request.side {
            Side::Buy => {
                if value > account.cash {
                    return Err(BrokerError::InsufficientFunds {
                        required: value,
                        available: account.cash,
                    });
                }
                account.cash -= value;
                match existing {
                    // entry price stays at the first fill
                    Some(index) => account.positions[index].quantity += request.quantity,
                    None => account
                        .positions
                        .push(Position::new(&request.symbol, request.quantity, price)),
                }
            }
            Side::Sell => {
                let index = existing
                    .ok_or_else(|| BrokerError::PositionNotFound(request.symbol.clone()))?;
                let held = account.positions[index].quantity;
                if request.quantity > held {
                    return Err(BrokerError::OrderRejected(format!(
                        "sell {} exceeds {} held in {}",
                        request.quantity, held, request.symbol
                    )));
                }
                account.cash += value;
                if request.quantity == held {
                    account.positions.remove(index);
                } else {
                    account.positions[index].quantity -= request.quantity;
                }
            }
        }
        account.marks.insert(request.symbol.clone(), price);

        let confirmation = OrderConfirmation {
            id: Uuid::new_v4().to_string(),
            symbol: request.symbol,
            side: request.side,
            quantity: request.quantity,
            status: "filled".to_string(),
            filled_avg_price: Some(price),
            submitted_at: Utc::now(),
        };
        debug!(
            symbol = %confirmation.symbol,
            side = %confirmation.side,
            quantity = confirmation.quantity,
            price = %price,
            "Paper fill"
        );
        account.orders.push(confirmation.clone());

        Ok(confirmation)
    }

    fn name(&self) -> &str {
        "Paper Broker"
    }
}

#[async_trait]
impl MarketData for PaperBroker {
    async fn fetch_price_history(&self, symbol: &str, min_days: u32) -> Result<PriceHistory, DataError> {
        let history = self.source.fetch_price_history(symbol, min_days).await?;
        if let Some(close) = history.last_close_decimal() {
            self.account.lock().await.marks.insert(symbol.to_string(), close);
        }
        Ok(history)
    }

    fn name(&self) -> &str {
        self.source.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    struct FixedPrices(HashMap<String, Vec<f64>>);

    #[async_trait]
    impl MarketData for FixedPrices {
        async fn fetch_price_history(&self, symbol: &str, _min_days: u32) -> Result<PriceHistory, DataError> {
            let closes = self
                .0
                .get(symbol)
                .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok(PriceHistory::from_closes(symbol, start, closes))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn broker(cash: Decimal) -> PaperBroker {
        let prices = [
            ("AAPL".to_string(), vec![140.0, 150.0]),
            ("MSFT".to_string(), vec![400.0]),
        ];
        PaperBroker::new(cash, Arc::new(FixedPrices(prices.into_iter().collect())))
    }

    #[tokio::test]
    async fn test_paper_broker_buy() {
        let broker = broker(dec!(100000));

        let request = OrderRequest::market("AAPL", Side::Buy, 100);
        let order = broker.submit_order(request).await.unwrap();

        assert_eq!(order.status, "filled");
        assert_eq!(order.filled_avg_price, Some(dec!(150)));

        let account = broker.get_account().await.unwrap();
        assert_eq!(account.cash, dec!(85000));
        assert_eq!(account.portfolio_value, dec!(100000));

        let positions = broker.get_positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].entry_price, dec!(150));
    }

    #[tokio::test]
    async fn test_paper_broker_close_position() {
        let broker = broker(dec!(100000));

        broker
            .submit_order(OrderRequest::market("AAPL", Side::Buy, 100))
            .await
            .unwrap();
        broker
            .submit_order(OrderRequest::market("AAPL", Side::Sell, 100))
            .await
            .unwrap();

        assert!(broker.get_positions().await.unwrap().is_empty());
        assert_eq!(broker.get_account().await.unwrap().cash, dec!(100000));
        assert_eq!(broker.orders().await.len(), 2);
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let broker = broker(dec!(1000));

        let result = broker
            .submit_order(OrderRequest::market("MSFT", Side::Buy, 3))
            .await;
        assert!(matches!(result, Err(BrokerError::InsufficientFunds { .. })));
    }

    #[tokio::test]
    async fn test_sell_without_position() {
        let broker = broker(dec!(1000));

        let result = broker
            .submit_order(OrderRequest::market("MSFT", Side::Sell, 1))
            .await;
        assert!(matches!(result, Err(BrokerError::PositionNotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_symbol_rejected() {
        let broker = broker(dec!(1000));

        let result = broker
            .submit_order(OrderRequest::market("ZZZZ", Side::Buy, 1))
            .await;
        assert!(matches!(result, Err(BrokerError::OrderRejected(_))));
    }

    #[tokio::test]
    async fn test_history_marks_seeded_positions() {
        let broker = broker(dec!(0))
            .with_position(Position::new("MSFT", 2, dec!(350)))
            .await;

        assert_eq!(broker.get_account().await.unwrap().portfolio_value, dec!(700));

        broker.fetch_price_history("MSFT", 10).await.unwrap();
        let account = broker.get_account().await.unwrap();
        assert_eq!(account.portfolio_value, dec!(800));
        assert_eq!(
            broker.get_positions().await.unwrap()[0].current_price,
            Some(dec!(400))
        );
        assert!(broker.is_market_open().await.unwrap());
    }
}
