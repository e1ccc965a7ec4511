//! Alpaca REST integration: account, positions, clock, orders and daily bars.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::{header, Client, Response, StatusCode};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crossover_core::error::{BrokerError, DataError};
use crossover_core::traits::{Broker, MarketData};
use crossover_core::types::{
    AccountSnapshot, OrderConfirmation, OrderRequest, Position, PriceBar, PriceHistory, Side,
};

const PAPER_URL: &str = "https://paper-api.alpaca.markets";
const LIVE_URL: &str = "https://api.alpaca.markets";
const DATA_URL: &str = "https://data.alpaca.markets";
const BARS_PAGE_LIMIT: u32 = 10_000;

/// Alpaca API configuration.
#[derive(Debug, Clone)]
pub struct AlpacaConfig {
    pub api_key: String,
    pub api_secret: String,
    pub paper: bool,
    /// Trading API override; defaults by `paper`
    pub base_url: Option<String>,
    pub data_url: String,
    /// Market data feed (`iex` or `sip`)
    pub feed: String,
}

impl AlpacaConfig {
    /// Create config directly with key and secret.
    pub fn new(api_key: String, api_secret: String, paper: bool) -> Self {
        Self {
            api_key,
            api_secret,
            paper,
            base_url: None,
            data_url: DATA_URL.to_string(),
            feed: "iex".to_string(),
        }
    }

    /// Load credentials from the named environment variables.
    pub fn from_env_vars(key_var: &str, secret_var: &str, paper: bool) -> Result<Self, BrokerError> {
        let api_key = std::env::var(key_var)
            .map_err(|_| BrokerError::Configuration(format!("{} not set", key_var)))?;
        let api_secret = std::env::var(secret_var)
            .map_err(|_| BrokerError::Configuration(format!("{} not set", secret_var)))?;

        Ok(Self::new(api_key, api_secret, paper))
    }

    /// Load from `ALPACA_API_KEY` / `ALPACA_SECRET_KEY`.
    pub fn from_env(paper: bool) -> Result<Self, BrokerError> {
        Self::from_env_vars("ALPACA_API_KEY", "ALPACA_SECRET_KEY", paper)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = url.into();
        self
    }

    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed = feed.into();
        self
    }

    pub fn base_url(&self) -> &str {
        match &self.base_url {
            Some(url) => url,
            None if self.paper => PAPER_URL,
            None => LIVE_URL,
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

#[derive(Debug, Deserialize)]
struct AlpacaAccount {
    cash: String,
    portfolio_value: String,
}

#[derive(Debug, Deserialize)]
struct AlpacaPosition {
    symbol: String,
    qty: String,
    avg_entry_price: String,
    current_price: Option<String>,
    market_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaOrder {
    id: String,
    status: String,
    symbol: String,
    qty: Option<String>,
    side: String,
    filled_avg_price: Option<String>,
    created_at: String,
    submitted_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    symbol: String,
    qty: String,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    time_in_force: &'static str,
}

#[derive(Debug, Deserialize)]
struct AlpacaBar {
    t: String,
    c: f64,
}

#[derive(Debug, Deserialize)]
struct AlpacaBarsResponse {
    bars: Option<Vec<AlpacaBar>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AlpacaClock {
    is_open: bool,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, BrokerError> {
    value
        .parse()
        .map_err(|_| BrokerError::ApiError(format!("invalid {}: {:?}", field, value)))
}

fn parse_account(account: AlpacaAccount) -> Result<AccountSnapshot, BrokerError> {
    Ok(AccountSnapshot::new(
        parse_decimal("cash", &account.cash)?,
        parse_decimal("portfolio_value", &account.portfolio_value)?,
    ))
}

/// Convert a long position. Short or fractional-only positions are skipped.
fn parse_position(p: AlpacaPosition) -> Result<Option<Position>, BrokerError> {
    let quantity = parse_decimal("qty", &p.qty)?.trunc().to_u64().unwrap_or(0);
    if quantity == 0 {
        warn!(symbol = %p.symbol, qty = %p.qty, "Skipping non-long position");
        return Ok(None);
    }

    let entry_price = parse_decimal("avg_entry_price", &p.avg_entry_price)?;
    let mut position = Position::new(p.symbol, quantity, entry_price);
    position.current_price = p.current_price.as_deref().and_then(|v| v.parse().ok());
    position.market_value = p.market_value.as_deref().and_then(|v| v.parse().ok());
    Ok(Some(position))
}

fn parse_order(order: AlpacaOrder) -> Result<OrderConfirmation, BrokerError> {
    let side = match order.side.as_str() {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        _ => return Err(BrokerError::ApiError(format!("Unknown side: {}", order.side))),
    };
    let quantity = match order.qty.as_deref() {
        Some(qty) => parse_decimal("qty", qty)?.trunc().to_u64().unwrap_or(0),
        None => 0,
    };
    let submitted_at = order
        .submitted_at
        .as_deref()
        .unwrap_or(&order.created_at)
        .parse::<DateTime<Utc>>()
        .unwrap_or_else(|_| Utc::now());

    Ok(OrderConfirmation {
        id: order.id,
        symbol: order.symbol,
        side,
        quantity,
        status: order.status,
        filled_avg_price: order.filled_avg_price.as_deref().and_then(|p| p.parse().ok()),
        submitted_at,
    })
}

fn parse_bar(bar: &AlpacaBar) -> Result<PriceBar, DataError> {
    let date = DateTime::parse_from_rfc3339(&bar.t)
        .map(|dt| dt.date_naive())
        .map_err(|e| DataError::ParseError(format!("bar timestamp {:?}: {}", bar.t, e)))?;
    Ok(PriceBar::new(date, bar.c))
}

async fn error_body(resp: Response) -> String {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    format!("{}: {}", status, text)
}

/// Alpaca broker client.
pub struct AlpacaBroker {
    config: AlpacaConfig,
    client: Client,
}

impl AlpacaBroker {
    /// Create a new Alpaca broker client.
    pub fn new(config: AlpacaConfig) -> Result<Self, BrokerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "APCA-API-KEY-ID",
            header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );
        headers.insert(
            "APCA-API-SECRET-KEY",
            header::HeaderValue::from_str(&config.api_secret)
                .map_err(|e| BrokerError::Configuration(e.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AlpacaConfig {
        &self.config
    }

    async fn get_trading<T: DeserializeOwned>(&self, path: &str) -> Result<T, BrokerError> {
        let url = format!("{}{}", self.config.base_url(), path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(BrokerError::ApiError(error_body(resp).await));
        }

        resp.json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))
    }

    /// Daily bars from `start` to now, following pagination.
    pub async fn get_daily_bars(&self, symbol: &str, start: NaiveDate) -> Result<Vec<PriceBar>, DataError> {
        let url = format!("{}/v2/stocks/{}/bars", self.config.data_url(), symbol);
        let mut bars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("timeframe", "1Day".to_string()),
                ("start", start.format("%Y-%m-%d").to_string()),
                ("feed", self.config.feed.clone()),
                ("adjustment", "raw".to_string()),
                ("limit", BARS_PAGE_LIMIT.to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("page_token", token.clone()));
            }

            let resp = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await
                .map_err(|e| DataError::ConnectionError(e.to_string()))?;

            match resp.status() {
                StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                    return Err(DataError::SymbolNotFound(symbol.to_string()));
                }
                status if !status.is_success() => {
                    return Err(DataError::ConnectionError(error_body(resp).await));
                }
                _ => {}
            }

            let page: AlpacaBarsResponse = resp
                .json()
                .await
                .map_err(|e| DataError::ParseError(e.to_string()))?;

            for bar in page.bars.iter().flatten() {
                bars.push(parse_bar(bar)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!(symbol = %symbol, bars = bars.len(), "Fetched daily bars");
        Ok(bars)
    }
}

#[async_trait]
impl Broker for AlpacaBroker {
    async fn get_account(&self) -> Result<AccountSnapshot, BrokerError> {
        let account: AlpacaAccount = self.get_trading("/v2/account").await?;
        parse_account(account)
    }

    async fn get_positions(&self) -> Result<Vec<Position>, BrokerError> {
        let positions: Vec<AlpacaPosition> = self.get_trading("/v2/positions").await?;
        let mut parsed = Vec::with_capacity(positions.len());
        for position in positions {
            if let Some(position) = parse_position(position)? {
                parsed.push(position);
            }
        }
        Ok(parsed)
    }

    async fn is_market_open(&self) -> Result<bool, BrokerError> {
        let clock: AlpacaClock = self.get_trading("/v2/clock").await?;
        Ok(clock.is_open)
    }

    async fn submit_order(&self, request: OrderRequest) -> Result<OrderConfirmation, BrokerError> {
        let url = format!("{}/v2/orders", self.config.base_url());
        let create_req = CreateOrderRequest {
            symbol: request.symbol.clone(),
            qty: request.quantity.to_string(),
            side: request.side.as_str(),
            order_type: "market",
            time_in_force: "gtc",
        };

        debug!("Submitting order: {:?}", create_req);

        let resp = self
            .client
            .post(&url)
            .json(&create_req)
            .send()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(BrokerError::OrderRejected(error_body(resp).await));
        }

        let order: AlpacaOrder = resp
            .json()
            .await
            .map_err(|e| BrokerError::ApiError(e.to_string()))?;

        info!(
            "Order submitted: {} {} {} ({})",
            order.side,
            order.qty.as_deref().unwrap_or("?"),
            order.symbol,
            order.status
        );
        parse_order(order)
    }

    fn name(&self) -> &str {
        if self.config.paper {
            "Alpaca Paper"
        } else {
            "Alpaca Live"
        }
    }
}

#[async_trait]
impl MarketData for AlpacaBroker {
    async fn fetch_price_history(&self, symbol: &str, min_days: u32) -> Result<PriceHistory, DataError> {
        let start = Utc::now().date_naive() - Duration::days(i64::from(min_days));
        let bars = self.get_daily_bars(symbol, start).await?;
        if bars.is_empty() {
            return Err(DataError::NoDataAvailable(symbol.to_string()));
        }
        Ok(PriceHistory::new(symbol, bars))
    }

    fn name(&self) -> &str {
        "Alpaca Market Data"
    }
}
