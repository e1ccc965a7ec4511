//! Trade intents emitted by the decision policies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderRequest, Side};

/// Why a trade was proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeReason {
    /// Short MA crossed above long MA
    GoldenCross,
    /// Short MA crossed below long MA
    DeathCross,
    /// Price fell to or below the stop line
    StopLoss,
}

impl std::fmt::Display for TradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeReason::GoldenCross => write!(f, "Golden Cross"),
            TradeReason::DeathCross => write!(f, "Death Cross"),
            TradeReason::StopLoss => write!(f, "Stop-Loss"),
        }
    }
}

/// An immutable proposal to buy or sell whole shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    action: Side,
    symbol: String,
    quantity: u64,
    reference_price: Decimal,
    reason: TradeReason,
}

impl TradeIntent {
    /// Create a buy intent. Returns `None` for a zero quantity.
    pub fn buy(
        symbol: impl Into<String>,
        quantity: u64,
        reference_price: Decimal,
        reason: TradeReason,
    ) -> Option<Self> {
        Self::new(Side::Buy, symbol, quantity, reference_price, reason)
    }

    /// Create a sell intent. Returns `None` for a zero quantity.
    pub fn sell(
        symbol: impl Into<String>,
        quantity: u64,
        reference_price: Decimal,
        reason: TradeReason,
    ) -> Option<Self> {
        Self::new(Side::Sell, symbol, quantity, reference_price, reason)
    }

    fn new(
        action: Side,
        symbol: impl Into<String>,
        quantity: u64,
        reference_price: Decimal,
        reason: TradeReason,
    ) -> Option<Self> {
        if quantity == 0 {
            return None;
        }
        Some(Self {
            action,
            symbol: symbol.into(),
            quantity,
            reference_price,
            reason,
        })
    }

    pub fn action(&self) -> Side {
        self.action
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// Price the decision was made at. Informational only.
    pub fn reference_price(&self) -> Decimal {
        self.reference_price
    }

    pub fn reason(&self) -> TradeReason {
        self.reason
    }

    /// Notional value at the reference price.
    pub fn notional(&self) -> Decimal {
        self.reference_price * Decimal::from(self.quantity)
    }

    /// The market order that executes this intent.
    pub fn to_order_request(&self) -> OrderRequest {
        OrderRequest::market(&self.symbol, self.action, self.quantity)
    }
}

impl std::fmt::Display for TradeIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} x{} @ ~{:.2} ({})",
            self.action, self.symbol, self.quantity, self.reference_price, self.reason
        )
    }
}
