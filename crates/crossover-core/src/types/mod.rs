//! Core data types for the crossover agent.

mod intent;
mod order;
mod position;
mod price;
mod summary;

pub use intent::{TradeIntent, TradeReason};
pub use order::{OrderConfirmation, OrderRequest, Side};
pub use position::{AccountSnapshot, Position};
pub use price::{PriceBar, PriceHistory};
pub use summary::{FailureStage, PassStatus, RunSummary, SymbolFailure};
