//! Stop-loss evaluation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crossover_core::error::StrategyError;

/// Fixed-fraction stop below the entry price of a long position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLoss {
    threshold: Decimal,
}

/// Outcome of checking one position against its stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLossCheck {
    pub stop_price: Decimal,
    /// Informational; never gates the decision
    pub pnl_percent: Option<Decimal>,
    pub breached: bool,
}

impl StopLoss {
    /// Create a stop at `threshold` below entry. The threshold must lie in (0, 1).
    pub fn new(threshold: Decimal) -> Result<Self, StrategyError> {
        if threshold <= Decimal::ZERO || threshold >= Decimal::ONE {
            return Err(StrategyError::InvalidConfig(format!(
                "stop-loss fraction must be in (0, 1), got {}",
                threshold
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Price at or below which the stop fires.
    pub fn stop_price(&self, entry_price: Decimal) -> Decimal {
        entry_price * (Decimal::ONE - self.threshold)
    }

    /// Check if the stop is triggered. Inclusive: landing on the line fires.
    pub fn is_breached(&self, entry_price: Decimal, current_price: Decimal) -> bool {
        current_price <= self.stop_price(entry_price)
    }

    pub fn evaluate(&self, entry_price: Decimal, current_price: Decimal) -> StopLossCheck {
        StopLossCheck {
            stop_price: self.stop_price(entry_price),
            pnl_percent: pnl_percent(entry_price, current_price),
            breached: self.is_breached(entry_price, current_price),
        }
    }
}

/// `current <= entry * (1 - threshold)`.
pub fn breached(entry_price: Decimal, current_price: Decimal, threshold: Decimal) -> bool {
    current_price <= entry_price * (Decimal::ONE - threshold)
}

/// `(current - entry) / entry * 100`, `None` for a zero entry price.
pub fn pnl_percent(entry_price: Decimal, current_price: Decimal) -> Option<Decimal> {
    if entry_price.is_zero() {
        return None;
    }
    Some((current_price - entry_price) / entry_price * Decimal::ONE_HUNDRED)
}
