//! Summary record produced at the end of each evaluation pass.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Position, Side, TradeIntent};

/// Where in the pass a per-symbol failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Fetching price history
    PriceHistory,
    /// Submitting an order
    OrderSubmission,
    /// Recording a trade to the trade log
    TradeLog,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::PriceHistory => write!(f, "price history"),
            FailureStage::OrderSubmission => write!(f, "order submission"),
            FailureStage::TradeLog => write!(f, "trade log"),
        }
    }
}

/// A failure isolated to one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub stage: FailureStage,
    pub message: String,
}

/// How the pass ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassStatus {
    /// Both phases ran
    Completed,
    /// A pass-fatal collaborator failure stopped the remaining phases
    Aborted { reason: String },
}

/// Aggregate of one evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: PassStatus,
    /// Intents whose orders were submitted, in emission order
    pub intents: Vec<TradeIntent>,
    pub portfolio_value: Decimal,
    pub cash: Decimal,
    pub positions: Vec<Position>,
    pub symbols_scanned: usize,
    pub golden_crosses_found: usize,
    pub failures: Vec<SymbolFailure>,
}

impl RunSummary {
    /// Wall-clock duration of the pass.
    pub fn execution_time(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.status, PassStatus::Aborted { .. })
    }

    /// Intents on one side.
    pub fn intents_for(&self, side: Side) -> impl Iterator<Item = &TradeIntent> {
        self.intents.iter().filter(move |i| i.action() == side)
    }

    /// Generate a text summary.
    pub fn text(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                   EVALUATION PASS SUMMARY                  \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("ACCOUNT\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Portfolio Value:     ${:.2}\n", self.portfolio_value));
        s.push_str(&format!("  Cash Available:      ${:.2}\n", self.cash));
        s.push_str(&format!("  Open Positions:      {}\n", self.positions.len()));
        for position in &self.positions {
            match position.unrealized_pnl_percent() {
                Some(pnl) => s.push_str(&format!(
                    "    {:<8} {:>6} sh  entry ${:.2}  P/L {:+.2}%\n",
                    position.symbol, position.quantity, position.entry_price, pnl
                )),
                None => s.push_str(&format!(
                    "    {:<8} {:>6} sh  entry ${:.2}\n",
                    position.symbol, position.quantity, position.entry_price
                )),
            }
        }
        s.push('\n');

        s.push_str("ACTIVITY\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        if self.intents.is_empty() {
            s.push_str("  No trades executed.\n");
        }
        for intent in &self.intents {
            s.push_str(&format!("  {}\n", intent));
        }
        s.push('\n');

        s.push_str("SCAN\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Symbols Scanned:     {}\n", self.symbols_scanned));
        s.push_str(&format!("  Golden Crosses:      {}\n", self.golden_crosses_found));
        s.push_str(&format!(
            "  Execution Time:      {:.2} seconds\n",
            self.execution_time().num_milliseconds() as f64 / 1000.0
        ));
        if let PassStatus::Aborted { reason } = &self.status {
            s.push_str(&format!("  Aborted:             {}\n", reason));
        }
        if !self.failures.is_empty() {
            s.push_str(&format!("  Failures:            {}\n", self.failures.len()));
            for failure in &self.failures {
                s.push_str(&format!(
                    "    {} ({}): {}\n",
                    failure.symbol, failure.stage, failure.message
                ));
            }
        }
        s.push('\n');

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
