//! Golden-cross strategy.
//!
//! Sells an open position on a death cross or a stop-loss breach (death
//! cross first), and buys a watchlist symbol on a golden cross when the
//! sized order fits the pass budget.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crossover_core::error::StrategyError;
use crossover_core::types::{Position, PriceHistory, TradeIntent, TradeReason};
use crossover_indicators::{latest, trailing_finite, CrossoverEvent, MaWindows, MovingAveragePair};
use crossover_risk::{PositionSizer, Sizing, StopLoss};

/// Configuration for the golden-cross strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenCrossConfig {
    /// Short moving average window
    pub short_window: usize,
    /// Long moving average window
    pub long_window: usize,
    /// Fraction of the sizing basis invested per buy
    pub per_trade_fraction: Decimal,
    /// Fraction below entry at which the stop fires
    pub stop_loss_fraction: Decimal,
}

impl Default for GoldenCrossConfig {
    fn default() -> Self {
        Self {
            short_window: 50,
            long_window: 200,
            per_trade_fraction: Decimal::new(25, 2),
            stop_loss_fraction: Decimal::new(5, 2),
        }
    }
}

impl GoldenCrossConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        MaWindows::new(self.short_window, self.long_window)?;
        PositionSizer::new(self.per_trade_fraction)?;
        StopLoss::new(self.stop_loss_fraction)?;
        Ok(())
    }
}

/// Calendar days that comfortably hold `long_window` trading days.
///
/// Roughly 252 trading days fit in 365 calendar days; the 1.5 factor
/// leaves room for weekends, holidays and the extra bar a cross needs.
pub fn default_history_days(long_window: usize) -> u32 {
    u32::try_from(long_window.saturating_mul(3).div_ceil(2)).unwrap_or(u32::MAX)
}

/// Outcome of evaluating an open position.
#[derive(Debug, Clone, PartialEq)]
pub enum SellDecision {
    /// Not enough finite closes for the long average; no decision made
    InsufficientData { required: usize, available: usize },
    /// Keep the position
    Hold {
        current_price: Decimal,
        stop_price: Decimal,
        pnl_percent: Option<Decimal>,
    },
    /// Close the whole position
    Sell(TradeIntent),
}

impl SellDecision {
    pub fn reason(&self) -> Option<TradeReason> {
        match self {
            SellDecision::Sell(intent) => Some(intent.reason()),
            _ => None,
        }
    }
}

/// Money the buy policy may commit to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuyBudget {
    /// Portfolio value snapshotted at pass start
    pub sizing_basis: Decimal,
    /// Cash still uncommitted in this pass
    pub available_cash: Decimal,
}

/// Outcome of evaluating a watchlist symbol for entry.
#[derive(Debug, Clone, PartialEq)]
pub enum BuyDecision {
    /// Not enough finite closes for the long average
    InsufficientData { required: usize, available: usize },
    /// Latest transition was not a golden cross
    NoSignal(CrossoverEvent),
    /// Golden cross, but the invest amount buys no whole share
    ZeroShares {
        price: Decimal,
        invest_amount: Decimal,
    },
    /// Golden cross, but the invest amount exceeds available cash
    InsufficientCash {
        invest_amount: Decimal,
        available_cash: Decimal,
    },
    Buy(TradeIntent),
}

impl BuyDecision {
    /// Whether a golden cross was observed, bought or not.
    pub fn is_golden_cross(&self) -> bool {
        matches!(
            self,
            BuyDecision::ZeroShares { .. } | BuyDecision::InsufficientCash { .. } | BuyDecision::Buy(_)
        )
    }

    pub fn intent(&self) -> Option<&TradeIntent> {
        match self {
            BuyDecision::Buy(intent) => Some(intent),
            _ => None,
        }
    }
}

/// Golden-cross decision policies. Stateless: the same inputs always give
/// the same decision.
#[derive(Debug, Clone)]
pub struct GoldenCrossStrategy {
    config: GoldenCrossConfig,
    windows: MaWindows,
    stop_loss: StopLoss,
    sizer: PositionSizer,
}

impl GoldenCrossStrategy {
    /// Create the strategy, rejecting malformed parameters.
    pub fn new(config: GoldenCrossConfig) -> Result<Self, StrategyError> {
        let windows = MaWindows::new(config.short_window, config.long_window)?;
        let stop_loss = StopLoss::new(config.stop_loss_fraction)?;
        let sizer = PositionSizer::new(config.per_trade_fraction)?;

        Ok(Self {
            config,
            windows,
            stop_loss,
            sizer,
        })
    }

    pub fn config(&self) -> &GoldenCrossConfig {
        &self.config
    }

    pub fn windows(&self) -> MaWindows {
        self.windows
    }

    /// Latest crossover, or the shortfall when the long average is undefined
    /// at the latest bar.
    fn latest_event(&self, history: &PriceHistory) -> Result<(CrossoverEvent, Decimal), (usize, usize)> {
        let closes = history.closes();
        let required = self.windows.long();
        let available = trailing_finite(&closes);
        if available < required {
            return Err((required, available));
        }
        let price = history
            .last_close_decimal()
            .ok_or((required, available))?;

        let pair = MovingAveragePair::with_windows(&closes, self.windows);
        Ok((latest(&pair), price))
    }

    /// Decide whether to close `position`. Death cross wins over stop-loss.
    pub fn decide_sell(&self, position: &Position, history: &PriceHistory) -> SellDecision {
        let (event, current_price) = match self.latest_event(history) {
            Ok(found) => found,
            Err((required, available)) => {
                return SellDecision::InsufficientData {
                    required,
                    available,
                }
            }
        };

        let check = self.stop_loss.evaluate(position.entry_price, current_price);
        let reason = if event == CrossoverEvent::Death {
            Some(TradeReason::DeathCross)
        } else if check.breached {
            Some(TradeReason::StopLoss)
        } else {
            None
        };

        let intent = reason.and_then(|reason| {
            TradeIntent::sell(&position.symbol, position.quantity, current_price, reason)
        });
        match intent {
            Some(intent) => SellDecision::Sell(intent),
            None => SellDecision::Hold {
                current_price,
                stop_price: check.stop_price,
                pnl_percent: check.pnl_percent,
            },
        }
    }

    /// Decide whether to open a position in `symbol`.
    ///
    /// The caller has already checked that `symbol` is not held and a slot
    /// is free.
    pub fn decide_buy(&self, symbol: &str, history: &PriceHistory, budget: BuyBudget) -> BuyDecision {
        let (event, price) = match self.latest_event(history) {
            Ok(found) => found,
            Err((required, available)) => {
                return BuyDecision::InsufficientData {
                    required,
                    available,
                }
            }
        };

        if event != CrossoverEvent::Golden {
            return BuyDecision::NoSignal(event);
        }
        debug!(symbol = %symbol, price = %price, "Golden cross on latest bar");

        match self
            .sizer
            .size(budget.sizing_basis, budget.available_cash, price)
        {
            Sizing::ZeroShares { invest_amount } => BuyDecision::ZeroShares {
                price,
                invest_amount,
            },
            Sizing::InsufficientCash {
                invest_amount,
                available_cash,
            } => BuyDecision::InsufficientCash {
                invest_amount,
                available_cash,
            },
            Sizing::Shares { quantity, .. } => {
                match TradeIntent::buy(symbol, quantity, price, TradeReason::GoldenCross) {
                    Some(intent) => BuyDecision::Buy(intent),
                    None => BuyDecision::ZeroShares {
                        price,
                        invest_amount: self.sizer.invest_amount(budget.sizing_basis),
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crossover_core::types::Side;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn strategy() -> GoldenCrossStrategy {
        GoldenCrossStrategy::new(GoldenCrossConfig {
            short_window: 2,
            long_window: 3,
            per_trade_fraction: dec!(0.25),
            stop_loss_fraction: dec!(0.05),
        })
        .unwrap()
    }

    /// Ends on a death cross: short(2) drops below long(3) on the last bar.
    fn death_cross_history() -> PriceHistory {
        PriceHistory::from_closes("XOM", start(), &[10.0, 11.0, 12.0, 9.0])
    }

    /// Ends on a golden cross: short(2) rises above long(3) on the last bar.
    fn golden_cross_history(last: f64) -> PriceHistory {
        // short: 8.5, 8.0, (8 + last)/2 ; long: 9.67, 8.33, (16 + last)/3
        PriceHistory::from_closes("AAPL", start(), &[12.0, 9.0, 8.0, 8.0, last])
    }

    #[test]
    fn test_default_history_days() {
        assert_eq!(default_history_days(200), 300);
        assert_eq!(default_history_days(50), 75);
        assert_eq!(default_history_days(3), 5);
    }

    #[test]
    fn test_config_validation() {
        assert!(GoldenCrossConfig::default().validate().is_ok());

        let config = GoldenCrossConfig {
            short_window: 200,
            long_window: 50,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(GoldenCrossStrategy::new(config).is_err());

        let config = GoldenCrossConfig {
            per_trade_fraction: dec!(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sell_insufficient_data() {
        let history = PriceHistory::from_closes("XOM", start(), &[10.0, 11.0]);
        let position = Position::new("XOM", 10, dec!(10));

        assert_eq!(
            strategy().decide_sell(&position, &history),
            SellDecision::InsufficientData {
                required: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_death_cross_wins_over_stop_loss() {
        // entry 100 puts the latest close of 9 far below the stop line
        let position = Position::new("XOM", 10, dec!(100));
        let decision = strategy().decide_sell(&position, &death_cross_history());

        assert_eq!(decision.reason(), Some(TradeReason::DeathCross));
        let SellDecision::Sell(intent) = decision else {
            panic!("expected a sell");
        };
        assert_eq!(intent.action(), Side::Sell);
        assert_eq!(intent.quantity(), 10);
        assert_eq!(intent.reference_price(), dec!(9));
    }

    #[test]
    fn test_stop_loss_without_cross() {
        let history = PriceHistory::from_closes("XOM", start(), &[10.0, 10.0, 10.0, 9.5]);
        let position = Position::new("XOM", 4, dec!(10));
        let decision = strategy().decide_sell(&position, &history);

        // 9.5 sits exactly on the 5% stop line
        assert_eq!(decision.reason(), Some(TradeReason::StopLoss));
    }

    #[test]
    fn test_hold() {
        let history = PriceHistory::from_closes("XOM", start(), &[10.0, 10.0, 10.0, 9.6]);
        let position = Position::new("XOM", 4, dec!(10));

        match strategy().decide_sell(&position, &history) {
            SellDecision::Hold {
                current_price,
                stop_price,
                pnl_percent,
            } => {
                assert_eq!(current_price, dec!(9.6));
                assert_eq!(stop_price, dec!(9.5));
                assert_eq!(pnl_percent, Some(dec!(-4)));
            }
            other => panic!("expected hold, got {:?}", other),
        }
    }

    #[test]
    fn test_buy_on_golden_cross() {
        let budget = BuyBudget {
            sizing_basis: dec!(10000),
            available_cash: dec!(10000),
        };
        let decision = strategy().decide_buy("AAPL", &golden_cross_history(12.0), budget);

        assert!(decision.is_golden_cross());
        let intent = decision.intent().unwrap();
        assert_eq!(intent.reason(), TradeReason::GoldenCross);
        // 2500 / 12 = 208.33
        assert_eq!(intent.quantity(), 208);
    }

    #[test]
    fn test_buy_zero_shares() {
        let budget = BuyBudget {
            sizing_basis: dec!(40),
            available_cash: dec!(40),
        };
        let decision = strategy().decide_buy("AAPL", &golden_cross_history(12.0), budget);

        assert_eq!(
            decision,
            BuyDecision::ZeroShares {
                price: dec!(12),
                invest_amount: dec!(10)
            }
        );
        assert!(decision.is_golden_cross());
        assert!(decision.intent().is_none());
    }

    #[test]
    fn test_buy_insufficient_cash() {
        let budget = BuyBudget {
            sizing_basis: dec!(10000),
            available_cash: dec!(1000),
        };
        let decision = strategy().decide_buy("AAPL", &golden_cross_history(12.0), budget);

        assert!(matches!(decision, BuyDecision::InsufficientCash { .. }));
    }

    #[test]
    fn test_no_signal() {
        let budget = BuyBudget {
            sizing_basis: dec!(10000),
            available_cash: dec!(10000),
        };
        let decision = strategy().decide_buy("XOM", &death_cross_history(), budget);

        assert_eq!(decision, BuyDecision::NoSignal(CrossoverEvent::Death));
        assert!(!decision.is_golden_cross());
    }

    #[test]
    fn test_decisions_are_repeatable() {
        let strategy = strategy();
        let history = golden_cross_history(12.0);
        let budget = BuyBudget {
            sizing_basis: dec!(5000),
            available_cash: dec!(5000),
        };

        assert_eq!(
            strategy.decide_buy("AAPL", &history, budget),
            strategy.decide_buy("AAPL", &history, budget)
        );
    }
}
