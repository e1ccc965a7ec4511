//! Risk rules for the crossover agent.
//!
//! Provides the stop-loss evaluator, fixed-fraction position sizing and
//! the position-count limit.

mod portfolio_limits;
mod position_sizer;
mod stop_loss;

pub use portfolio_limits::PositionLimits;
pub use position_sizer::{PositionSizer, Sizing};
pub use stop_loss::{breached, pnl_percent, StopLoss, StopLossCheck};
