//! Position and account types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open long position, as reported by the broker.
///
/// `entry_price` is fixed when the position opens; the agent never tops up,
/// so it is never re-averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Symbol
    pub symbol: String,
    /// Number of whole shares held
    pub quantity: u64,
    /// Entry price, basis for P/L and stop-loss
    pub entry_price: Decimal,
    /// Last price the broker marked the position at
    pub current_price: Option<Decimal>,
    /// Market value the broker reported
    pub market_value: Option<Decimal>,
}

impl Position {
    /// Create a new position.
    pub fn new(symbol: impl Into<String>, quantity: u64, entry_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            entry_price,
            current_price: None,
            market_value: None,
        }
    }

    /// Mark the position at a price.
    pub fn with_current_price(mut self, price: Decimal) -> Self {
        self.current_price = Some(price);
        self.market_value = Some(price * Decimal::from(self.quantity));
        self
    }

    /// Cost basis (quantity * entry_price).
    pub fn cost_basis(&self) -> Decimal {
        self.entry_price * Decimal::from(self.quantity)
    }

    /// Unrealized P/L percentage at the marked price.
    pub fn unrealized_pnl_percent(&self) -> Option<Decimal> {
        let current = self.current_price?;
        if self.entry_price == Decimal::ZERO {
            return None;
        }
        Some((current - self.entry_price) / self.entry_price * Decimal::from(100))
    }
}

/// Account balances queried at the pass checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// Settled cash available
    pub cash: Decimal,
    /// Total portfolio value (cash + positions)
    pub portfolio_value: Decimal,
}

impl AccountSnapshot {
    /// Create a new snapshot.
    pub fn new(cash: Decimal, portfolio_value: Decimal) -> Self {
        Self {
            cash,
            portfolio_value,
        }
    }
}
