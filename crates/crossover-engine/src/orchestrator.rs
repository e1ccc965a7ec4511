//! Evaluation pass orchestrator.
//!
//! One pass runs `Idle -> CheckingSells -> ScanningBuys -> Reporting -> Idle`
//! sequentially: every collaborator call is awaited before the next
//! decision is made.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crossover_core::error::AgentResult;
use crossover_core::traits::{Broker, MarketData, NullSink, SummaryPublisher, TradeRecorder};
use crossover_core::types::{
    AccountSnapshot, FailureStage, PassStatus, Position, PriceHistory, RunSummary, TradeIntent,
};
use crossover_risk::PositionLimits;
use crossover_strategy::{default_history_days, BuyDecision, GoldenCrossStrategy, SellDecision};

use crate::run_state::{PassTally, RunState};

/// Orchestrator phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CheckingSells,
    ScanningBuys,
    Reporting,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::CheckingSells => write!(f, "checking sells"),
            Phase::ScanningBuys => write!(f, "scanning buys"),
            Phase::Reporting => write!(f, "reporting"),
        }
    }
}

/// How a pass ended.
#[derive(Debug, Clone)]
pub enum PassOutcome {
    /// Session closed (or clock unavailable); nothing evaluated, nothing reported
    MarketClosed,
    Completed(RunSummary),
    /// A pass-fatal account failure cut the pass short; partial summary
    Aborted(RunSummary),
}

impl PassOutcome {
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            PassOutcome::MarketClosed => None,
            PassOutcome::Completed(summary) | PassOutcome::Aborted(summary) => Some(summary),
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, PassOutcome::Aborted(_))
    }
}

/// Runs evaluation passes against injected collaborators.
pub struct Orchestrator {
    strategy: GoldenCrossStrategy,
    limits: PositionLimits,
    watchlist: Vec<String>,
    history_days: u32,
    broker: Arc<dyn Broker>,
    market_data: Arc<dyn MarketData>,
    recorder: Arc<dyn TradeRecorder>,
    publishers: Vec<Arc<dyn SummaryPublisher>>,
}

impl Orchestrator {
    /// Create an orchestrator. Watchlist order is the buy-scan order.
    pub fn new(
        strategy: GoldenCrossStrategy,
        limits: PositionLimits,
        watchlist: Vec<String>,
        broker: Arc<dyn Broker>,
        market_data: Arc<dyn MarketData>,
    ) -> Self {
        let history_days = default_history_days(strategy.windows().long());
        Self {
            strategy,
            limits,
            watchlist,
            history_days,
            broker,
            market_data,
            recorder: Arc::new(NullSink),
            publishers: Vec::new(),
        }
    }

    /// Calendar days of history requested per symbol.
    pub fn with_history_days(mut self, days: u32) -> Self {
        self.history_days = days;
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn TradeRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn SummaryPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    fn enter(&self, phase: Phase) {
        info!(phase = %phase, "Entering phase");
    }

    /// Run one full evaluation pass.
    pub async fn run_pass(&self) -> PassOutcome {
        let started_at = Utc::now();
        self.enter(Phase::Idle);

        let open = match self.broker.is_market_open().await {
            Ok(open) => open,
            Err(e) => {
                warn!(error = %e, "Market clock unavailable, treating session as closed");
                false
            }
        };
        if !open {
            info!("Market is closed. Skipping trade evaluation.");
            return PassOutcome::MarketClosed;
        }

        let mut tally = PassTally::default();

        let (account, positions) = match self.load_book().await {
            Ok(book) => book,
            Err(e) => {
                error!(error = %e, "Account unavailable at pass start");
                let state = RunState::new(AccountSnapshot::default(), Vec::new());
                let status = PassStatus::Aborted {
                    reason: format!("account unavailable at pass start: {}", e),
                };
                return self.report(started_at, state, tally, status).await;
            }
        };
        info!(
            portfolio_value = %account.portfolio_value,
            cash = %account.cash,
            positions = positions.len(),
            "Pass started"
        );
        let mut state = RunState::new(account, positions);

        self.enter(Phase::CheckingSells);
        let sells = self.check_sells(&mut state, &mut tally).await;

        if sells > 0 {
            match self.broker.get_account().await {
                Ok(account) => state.refresh(account),
                Err(e) => {
                    error!(error = %e, "Account refresh after sells failed");
                    let status = PassStatus::Aborted {
                        reason: format!("account refresh after sells failed: {}", e),
                    };
                    return self.report(started_at, state, tally, status).await;
                }
            }
        }

        self.enter(Phase::ScanningBuys);
        self.scan_buys(&mut state, &mut tally).await;

        self.report(started_at, state, tally, PassStatus::Completed)
            .await
    }

    async fn load_book(&self) -> AgentResult<(AccountSnapshot, Vec<Position>)> {
        let account = self.broker.get_account().await?;
        let positions = self.broker.get_positions().await?;
        Ok((account, positions))
    }

    async fn fetch(&self, symbol: &str, tally: &mut PassTally) -> Option<PriceHistory> {
        match self
            .market_data
            .fetch_price_history(symbol, self.history_days)
            .await
        {
            Ok(history) => Some(history),
            Err(e) => {
                error!(symbol = %symbol, error = %e, "Price history unavailable");
                tally.fail(symbol, FailureStage::PriceHistory, e);
                None
            }
        }
    }

    /// Submit an intent's order and record it. Returns false if the order
    /// was not accepted; trade-log failures do not undo an accepted order.
    async fn execute(&self, intent: &TradeIntent, tally: &mut PassTally) -> bool {
        info!(
            symbol = %intent.symbol(),
            side = %intent.action(),
            quantity = intent.quantity(),
            price = %intent.reference_price(),
            reason = %intent.reason(),
            "Submitting order"
        );

        let confirmation = match self.broker.submit_order(intent.to_order_request()).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                error!(symbol = %intent.symbol(), error = %e, "Order submission failed");
                tally.fail(intent.symbol(), FailureStage::OrderSubmission, e);
                return false;
            }
        };
        info!(symbol = %intent.symbol(), order_id = %confirmation.id, "Order submitted");

        let executed_price = confirmation
            .filled_avg_price
            .unwrap_or_else(|| intent.reference_price());
        if let Err(e) = self
            .recorder
            .record_trade(intent, executed_price, confirmation.submitted_at)
            .await
        {
            warn!(symbol = %intent.symbol(), error = %e, "Failed to record trade");
            tally.fail(intent.symbol(), FailureStage::TradeLog, e);
        }

        tally.intents.push(intent.clone());
        true
    }

    /// Evaluate every open position, in account order. Returns the number
    /// of sell orders accepted.
    async fn check_sells(&self, state: &mut RunState, tally: &mut PassTally) -> usize {
        let positions = state.open_positions().to_vec();
        if positions.is_empty() {
            info!("No positions to check");
            return 0;
        }

        let mut sells = 0;
        for position in &positions {
            let Some(history) = self.fetch(&position.symbol, tally).await else {
                continue;
            };

            match self.strategy.decide_sell(position, &history) {
                SellDecision::InsufficientData {
                    required,
                    available,
                } => {
                    warn!(
                        symbol = %position.symbol,
                        required,
                        available,
                        "Insufficient data, no sell decision"
                    );
                }
                SellDecision::Hold {
                    current_price,
                    stop_price,
                    pnl_percent,
                } => {
                    info!(
                        symbol = %position.symbol,
                        entry = %position.entry_price,
                        current = %current_price,
                        stop = %stop_price,
                        pnl_percent = ?pnl_percent.map(|p| p.round_dp(2)),
                        "HOLD"
                    );
                }
                SellDecision::Sell(intent) => {
                    if self.execute(&intent, tally).await {
                        state.apply_sell(&intent);
                        sells += 1;
                    }
                }
            }
        }
        sells
    }

    /// Walk the watchlist in declared order, first come first served, until
    /// the slots are full.
    async fn scan_buys(&self, state: &mut RunState, tally: &mut PassTally) {
        if self.limits.is_full(state.open_count()) {
            info!(
                max_positions = self.limits.max_positions(),
                "Maximum positions reached. Skipping buy scan."
            );
            return;
        }
        info!(symbols = self.watchlist.len(), "Scanning watchlist");

        for symbol in &self.watchlist {
            if state.holds(symbol) {
                continue;
            }
            let Some(history) = self.fetch(symbol, tally).await else {
                continue;
            };
            tally.symbols_scanned += 1;

            let decision = self.strategy.decide_buy(symbol, &history, state.budget());
            if decision.is_golden_cross() {
                tally.golden_crosses_found += 1;
            }

            match decision {
                BuyDecision::Buy(intent) => {
                    if !self.execute(&intent, tally).await {
                        continue;
                    }
                    state.apply_buy(&intent);
                    if self.limits.is_full(state.open_count()) {
                        info!(
                            max_positions = self.limits.max_positions(),
                            "Maximum positions reached"
                        );
                        break;
                    }
                }
                BuyDecision::ZeroShares {
                    price,
                    invest_amount,
                } => {
                    warn!(
                        symbol = %symbol,
                        invest_amount = %invest_amount,
                        price = %price,
                        "Insufficient funds for one share"
                    );
                }
                BuyDecision::InsufficientCash {
                    invest_amount,
                    available_cash,
                } => {
                    warn!(
                        symbol = %symbol,
                        invest_amount = %invest_amount,
                        available_cash = %available_cash,
                        "Insufficient cash"
                    );
                }
                BuyDecision::NoSignal(event) => {
                    debug!(symbol = %symbol, event = %event, "No golden cross");
                }
                BuyDecision::InsufficientData {
                    required,
                    available,
                } => {
                    debug!(symbol = %symbol, required, available, "Insufficient data");
                }
            }
        }
    }

    /// Build the summary from a final account reading (falling back to the
    /// pass state) and hand it to every publisher.
    async fn report(
        &self,
        started_at: chrono::DateTime<Utc>,
        state: RunState,
        tally: PassTally,
        status: PassStatus,
    ) -> PassOutcome {
        self.enter(Phase::Reporting);

        let (cash, portfolio_value) = match self.broker.get_account().await {
            Ok(account) => (account.cash, account.portfolio_value),
            Err(e) => {
                warn!(error = %e, "Final account query failed, reporting pass state");
                (state.available_cash(), state.portfolio_value())
            }
        };
        let positions = match self.broker.get_positions().await {
            Ok(positions) => positions,
            Err(e) => {
                warn!(error = %e, "Final position query failed, reporting pass state");
                state.open_positions().to_vec()
            }
        };

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            status,
            intents: tally.intents,
            portfolio_value,
            cash,
            positions,
            symbols_scanned: tally.symbols_scanned,
            golden_crosses_found: tally.golden_crosses_found,
            failures: tally.failures,
        };

        for publisher in &self.publishers {
            if let Err(e) = publisher.publish_summary(&summary).await {
                warn!(error = %e, "Failed to publish summary");
            }
        }

        info!(
            trades = summary.intents.len(),
            failures = summary.failures.len(),
            aborted = summary.is_aborted(),
            "Pass finished"
        );
        self.enter(Phase::Idle);

        if summary.is_aborted() {
            PassOutcome::Aborted(summary)
        } else {
            PassOutcome::Completed(summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate};
    use crossover_core::error::{BrokerError, DataError, SinkError};
    use crossover_core::types::{OrderConfirmation, OrderRequest, Side, TradeReason};
    use crossover_strategy::GoldenCrossConfig;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // windows 2/3: these end on a golden cross, a death cross, and nothing
    const GOLDEN: [f64; 5] = [12.0, 9.0, 8.0, 8.0, 12.0];
    const DEATH: [f64; 4] = [10.0, 11.0, 12.0, 9.0];
    const FLAT: [f64; 4] = [10.0, 10.0, 10.0, 10.0];

    struct MockBroker {
        market: Option<bool>,
        account: AccountSnapshot,
        positions: Vec<Position>,
        /// `get_account` calls succeed until this many have been made
        account_ok_calls: Option<usize>,
        reject: Vec<String>,
        account_calls: Mutex<usize>,
        orders: Mutex<Vec<OrderRequest>>,
    }

    impl MockBroker {
        fn new(positions: Vec<Position>) -> Self {
            Self {
                market: Some(true),
                account: AccountSnapshot::new(dec!(10000), dec!(10000)),
                positions,
                account_ok_calls: None,
                reject: Vec::new(),
                account_calls: Mutex::new(0),
                orders: Mutex::new(Vec::new()),
            }
        }

        fn orders(&self) -> Vec<OrderRequest> {
            self.orders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Broker for MockBroker {
        async fn get_account(&self) -> Result<AccountSnapshot, BrokerError> {
            let mut calls = self.account_calls.lock().unwrap();
            *calls += 1;
            match self.account_ok_calls {
                Some(limit) if *calls > limit => {
                    Err(BrokerError::Connection("account endpoint down".into()))
                }
                _ => Ok(self.account),
            }
        }

        async fn get_positions(&self) -> Result<Vec<Position>, BrokerError> {
            Ok(self.positions.clone())
        }

        async fn is_market_open(&self) -> Result<bool, BrokerError> {
            self.market
                .ok_or_else(|| BrokerError::Connection("clock unavailable".into()))
        }

        async fn submit_order(&self, request: OrderRequest) -> Result<OrderConfirmation, BrokerError> {
            if self.reject.contains(&request.symbol) {
                return Err(BrokerError::OrderRejected(format!("{} halted", request.symbol)));
            }
            self.orders.lock().unwrap().push(request.clone());
            Ok(OrderConfirmation {
                id: format!("order-{}", request.symbol),
                symbol: request.symbol,
                side: request.side,
                quantity: request.quantity,
                status: "accepted".into(),
                filled_avg_price: None,
                submitted_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    struct MockData {
        closes: HashMap<String, Vec<f64>>,
    }

    impl MockData {
        fn new(entries: &[(&str, &[f64])]) -> Self {
            Self {
                closes: entries
                    .iter()
                    .map(|(symbol, closes)| (symbol.to_string(), closes.to_vec()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl MarketData for MockData {
        async fn fetch_price_history(
            &self,
            symbol: &str,
            _min_days: u32,
        ) -> Result<PriceHistory, DataError> {
            let closes = self
                .closes
                .get(symbol)
                .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))?;
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            Ok(PriceHistory::from_closes(symbol, start, closes))
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[derive(Default)]
    struct Recorder {
        trades: Mutex<Vec<(String, Decimal)>>,
        fail: bool,
    }

    #[async_trait]
    impl TradeRecorder for Recorder {
        async fn record_trade(
            &self,
            intent: &TradeIntent,
            executed_price: Decimal,
            _timestamp: DateTime<Utc>,
        ) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError::Encoding("disk full".into()));
            }
            self.trades
                .lock()
                .unwrap()
                .push((intent.symbol().to_string(), executed_price));
            Ok(())
        }
    }

    #[derive(Default)]
    struct Publisher {
        summaries: Mutex<Vec<RunSummary>>,
    }

    #[async_trait]
    impl SummaryPublisher for Publisher {
        async fn publish_summary(&self, summary: &RunSummary) -> Result<(), SinkError> {
            self.summaries.lock().unwrap().push(summary.clone());
            Ok(())
        }
    }

    struct Harness {
        broker: Arc<MockBroker>,
        recorder: Arc<Recorder>,
        publisher: Arc<Publisher>,
        orchestrator: Orchestrator,
    }

    fn harness(broker: MockBroker, data: MockData, watchlist: &[&str], max_positions: usize) -> Harness {
        harness_with_recorder(broker, data, watchlist, max_positions, Recorder::default())
    }

    fn harness_with_recorder(
        broker: MockBroker,
        data: MockData,
        watchlist: &[&str],
        max_positions: usize,
        recorder: Recorder,
    ) -> Harness {
        let strategy = GoldenCrossStrategy::new(GoldenCrossConfig {
            short_window: 2,
            long_window: 3,
            per_trade_fraction: dec!(0.25),
            stop_loss_fraction: dec!(0.05),
        })
        .unwrap();
        let broker = Arc::new(broker);
        let recorder = Arc::new(recorder);
        let publisher = Arc::new(Publisher::default());

        let orchestrator = Orchestrator::new(
            strategy,
            PositionLimits::new(max_positions).unwrap(),
            watchlist.iter().map(|s| s.to_string()).collect(),
            broker.clone(),
            Arc::new(data),
        )
        .with_recorder(recorder.clone())
        .with_publisher(publisher.clone());

        Harness {
            broker,
            recorder,
            publisher,
            orchestrator,
        }
    }

    fn completed(outcome: PassOutcome) -> RunSummary {
        match outcome {
            PassOutcome::Completed(summary) => summary,
            other => panic!("expected a completed pass, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_market_closed_skips_pass() {
        let mut broker = MockBroker::new(vec![Position::new("XOM", 10, dec!(10))]);
        broker.market = Some(false);
        let h = harness(broker, MockData::new(&[("XOM", &DEATH)]), &["AAPL"], 4);

        let outcome = h.orchestrator.run_pass().await;

        assert!(matches!(outcome, PassOutcome::MarketClosed));
        assert!(h.broker.orders().is_empty());
        assert!(h.publisher.summaries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clock_failure_treated_as_closed() {
        let mut broker = MockBroker::new(Vec::new());
        broker.market = None;
        let h = harness(broker, MockData::new(&[("AAPL", &GOLDEN)]), &["AAPL"], 4);

        assert!(matches!(h.orchestrator.run_pass().await, PassOutcome::MarketClosed));
        assert!(h.broker.orders().is_empty());
    }

    #[tokio::test]
    async fn test_sells_then_buys() {
        let broker = MockBroker::new(vec![
            Position::new("XOM", 10, dec!(10)),
            Position::new("MSFT", 5, dec!(10)),
        ]);
        let data = MockData::new(&[
            ("XOM", &DEATH),
            ("MSFT", &FLAT),
            ("AAPL", &GOLDEN),
            ("KO", &FLAT),
        ]);
        let h = harness(broker, data, &["MSFT", "KO", "AAPL"], 4);

        let summary = completed(h.orchestrator.run_pass().await);

        let orders = h.broker.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0], OrderRequest::market("XOM", Side::Sell, 10));
        // 10000 * 0.25 / 12 = 208.3
        assert_eq!(orders[1], OrderRequest::market("AAPL", Side::Buy, 208));

        assert_eq!(summary.intents.len(), 2);
        assert_eq!(summary.intents[0].reason(), TradeReason::DeathCross);
        assert_eq!(summary.intents[1].reason(), TradeReason::GoldenCross);
        // MSFT is held, so only KO and AAPL are evaluated
        assert_eq!(summary.symbols_scanned, 2);
        assert_eq!(summary.golden_crosses_found, 1);
        assert!(summary.failures.is_empty());

        let trades = h.recorder.trades.lock().unwrap().clone();
        assert_eq!(
            trades,
            vec![("XOM".to_string(), dec!(9)), ("AAPL".to_string(), dec!(12))]
        );
        assert_eq!(h.publisher.summaries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scan_stops_when_slots_fill() {
        let broker = MockBroker::new(vec![Position::new("MSFT", 5, dec!(10))]);
        let data = MockData::new(&[
            ("MSFT", &FLAT),
            ("AAPL", &GOLDEN),
            ("NVDA", &GOLDEN),
            ("AMD", &GOLDEN),
        ]);
        let h = harness(broker, data, &["AAPL", "NVDA", "AMD"], 2);

        let summary = completed(h.orchestrator.run_pass().await);

        let orders = h.broker.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].symbol, "AAPL");
        assert_eq!(summary.symbols_scanned, 1);
    }

    #[tokio::test]
    async fn test_full_book_skips_buy_scan() {
        let broker = MockBroker::new(vec![
            Position::new("MSFT", 5, dec!(10)),
            Position::new("KO", 5, dec!(10)),
        ]);
        let data = MockData::new(&[("MSFT", &FLAT), ("KO", &FLAT), ("AAPL", &GOLDEN)]);
        let h = harness(broker, data, &["AAPL"], 2);

        let summary = completed(h.orchestrator.run_pass().await);

        assert!(h.broker.orders().is_empty());
        assert_eq!(summary.symbols_scanned, 0);
    }

    #[tokio::test]
    async fn test_sell_frees_slot_for_buy() {
        let broker = MockBroker::new(vec![Position::new("XOM", 10, dec!(10))]);
        let data = MockData::new(&[("XOM", &DEATH), ("AAPL", &GOLDEN)]);
        let h = harness(broker, data, &["AAPL"], 1);

        completed(h.orchestrator.run_pass().await);

        let symbols: Vec<_> = h.broker.orders().into_iter().map(|o| o.symbol).collect();
        assert_eq!(symbols, vec!["XOM", "AAPL"]);
    }

    #[tokio::test]
    async fn test_order_failure_is_isolated() {
        let mut broker = MockBroker::new(vec![
            Position::new("XOM", 10, dec!(10)),
            Position::new("CVX", 3, dec!(10)),
        ]);
        broker.reject = vec!["XOM".to_string(), "AAPL".to_string()];
        let data = MockData::new(&[
            ("XOM", &DEATH),
            ("CVX", &DEATH),
            ("AAPL", &GOLDEN),
            ("NVDA", &GOLDEN),
        ]);
        let h = harness(broker, data, &["AAPL", "NVDA"], 4);

        let summary = completed(h.orchestrator.run_pass().await);

        let symbols: Vec<_> = h.broker.orders().into_iter().map(|o| o.symbol).collect();
        assert_eq!(symbols, vec!["CVX", "NVDA"]);
        assert_eq!(summary.failures.len(), 2);
        assert!(summary
            .failures
            .iter()
            .all(|f| f.stage == FailureStage::OrderSubmission));
        assert_eq!(summary.intents.len(), 2);
        assert_eq!(summary.golden_crosses_found, 2);
    }

    #[tokio::test]
    async fn test_missing_history_is_isolated() {
        let broker = MockBroker::new(vec![Position::new("GONE", 10, dec!(10))]);
        let data = MockData::new(&[("AAPL", &GOLDEN)]);
        let h = harness(broker, data, &["BRK.B", "AAPL"], 4);

        let summary = completed(h.orchestrator.run_pass().await);

        assert_eq!(summary.failures.len(), 2);
        assert_eq!(summary.failures[0].symbol, "GONE");
        assert_eq!(summary.failures[1].symbol, "BRK.B");
        assert!(summary
            .failures
            .iter()
            .all(|f| f.stage == FailureStage::PriceHistory));
        assert_eq!(h.broker.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_trade_log_failure_does_not_abort() {
        let broker = MockBroker::new(Vec::new());
        let data = MockData::new(&[("AAPL", &GOLDEN)]);
        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };
        let h = harness_with_recorder(broker, data, &["AAPL"], 4, recorder);

        let summary = completed(h.orchestrator.run_pass().await);

        assert_eq!(summary.intents.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].stage, FailureStage::TradeLog);
    }

    #[tokio::test]
    async fn test_account_failure_at_start_aborts() {
        let mut broker = MockBroker::new(vec![Position::new("XOM", 10, dec!(10))]);
        broker.account_ok_calls = Some(0);
        let data = MockData::new(&[("XOM", &DEATH), ("AAPL", &GOLDEN)]);
        let h = harness(broker, data, &["AAPL"], 4);

        let outcome = h.orchestrator.run_pass().await;

        assert!(outcome.is_aborted());
        assert!(h.broker.orders().is_empty());
        let summaries = h.publisher.summaries.lock().unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].is_aborted());
    }

    #[tokio::test]
    async fn test_refresh_failure_after_sells_skips_buys() {
        let mut broker = MockBroker::new(vec![Position::new("XOM", 10, dec!(10))]);
        // pass start succeeds, the post-sell refresh fails
        broker.account_ok_calls = Some(1);
        let data = MockData::new(&[("XOM", &DEATH), ("AAPL", &GOLDEN)]);
        let h = harness(broker, data, &["AAPL"], 4);

        let outcome = h.orchestrator.run_pass().await;

        let summary = outcome.summary().unwrap();
        assert!(outcome.is_aborted());
        assert_eq!(summary.intents.len(), 1);
        assert_eq!(summary.intents[0].symbol(), "XOM");
        let symbols: Vec<_> = h.broker.orders().into_iter().map(|o| o.symbol).collect();
        assert_eq!(symbols, vec!["XOM"]);
        // reporting falls back to the pass state: 10000 + 10 * 9
        assert_eq!(summary.cash, dec!(10090));
    }

    #[tokio::test]
    async fn test_insufficient_cash_skips_buy() {
        let mut broker = MockBroker::new(Vec::new());
        broker.account = AccountSnapshot::new(dec!(1000), dec!(10000));
        let data = MockData::new(&[("AAPL", &GOLDEN)]);
        let h = harness(broker, data, &["AAPL"], 4);

        let summary = completed(h.orchestrator.run_pass().await);

        assert!(h.broker.orders().is_empty());
        assert_eq!(summary.golden_crosses_found, 1);
        assert!(summary.intents.is_empty());
    }
}
