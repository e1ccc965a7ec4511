//! Position sizing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crossover_core::error::StrategyError;

/// Sizes each buy as a fixed fraction of a sizing basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSizer {
    per_trade_fraction: Decimal,
}

/// Result of sizing one buy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sizing {
    /// Whole shares to buy
    Shares { quantity: u64, invest_amount: Decimal },
    /// Not even one share fits in the invest amount
    ZeroShares { invest_amount: Decimal },
    /// The invest amount exceeds the cash still available this pass
    InsufficientCash {
        invest_amount: Decimal,
        available_cash: Decimal,
    },
}

impl PositionSizer {
    /// Create a sizer. The fraction must lie in (0, 1).
    pub fn new(per_trade_fraction: Decimal) -> Result<Self, StrategyError> {
        if per_trade_fraction <= Decimal::ZERO || per_trade_fraction >= Decimal::ONE {
            return Err(StrategyError::InvalidConfig(format!(
                "per-trade fraction must be in (0, 1), got {}",
                per_trade_fraction
            )));
        }
        Ok(Self { per_trade_fraction })
    }

    pub fn per_trade_fraction(&self) -> Decimal {
        self.per_trade_fraction
    }

    pub fn invest_amount(&self, sizing_basis: Decimal) -> Decimal {
        sizing_basis * self.per_trade_fraction
    }

    /// Whole shares `invest_amount` buys at `price`, truncated toward zero.
    pub fn quantity(invest_amount: Decimal, price: Decimal) -> u64 {
        if price <= Decimal::ZERO || invest_amount <= Decimal::ZERO {
            return 0;
        }
        (invest_amount / price).trunc().to_u64().unwrap_or(0)
    }

    /// Size a buy against `sizing_basis`, then check it against the cash
    /// still available.
    pub fn size(&self, sizing_basis: Decimal, available_cash: Decimal, price: Decimal) -> Sizing {
        let invest_amount = self.invest_amount(sizing_basis);
        let quantity = Self::quantity(invest_amount, price);

        if quantity == 0 {
            Sizing::ZeroShares { invest_amount }
        } else if invest_amount > available_cash {
            Sizing::InsufficientCash {
                invest_amount,
                available_cash,
            }
        } else {
            Sizing::Shares {
                quantity,
                invest_amount,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantity_truncates() {
        let sizer = PositionSizer::new(dec!(0.25)).unwrap();

        assert_eq!(sizer.invest_amount(dec!(10000)), dec!(2500.00));
        assert_eq!(
            sizer.size(dec!(10000), dec!(10000), dec!(333.33)),
            Sizing::Shares {
                quantity: 7,
                invest_amount: dec!(2500)
            }
        );
    }

    #[test]
    fn test_zero_shares() {
        let sizer = PositionSizer::new(dec!(0.25)).unwrap();

        assert_eq!(sizer.invest_amount(dec!(100)), dec!(25));
        assert_eq!(
            sizer.size(dec!(100), dec!(100), dec!(1000)),
            Sizing::ZeroShares {
                invest_amount: dec!(25)
            }
        );
    }

    #[test]
    fn test_insufficient_cash() {
        let sizer = PositionSizer::new(dec!(0.25)).unwrap();

        assert_eq!(
            sizer.size(dec!(10000), dec!(2000), dec!(100)),
            Sizing::InsufficientCash {
                invest_amount: dec!(2500),
                available_cash: dec!(2000)
            }
        );
    }

    #[test]
    fn test_non_positive_price() {
        assert_eq!(PositionSizer::quantity(dec!(1000), Decimal::ZERO), 0);
        assert_eq!(PositionSizer::quantity(dec!(1000), dec!(-5)), 0);
    }

    #[test]
    fn test_fraction_validation() {
        assert!(PositionSizer::new(dec!(0)).is_err());
        assert!(PositionSizer::new(dec!(1)).is_err());
        assert!(PositionSizer::new(dec!(0.5)).is_ok());
    }
}
