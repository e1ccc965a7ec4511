//! Core traits for the crossover agent.

mod broker;
mod indicator;
mod market_data;
mod sinks;

pub use broker::Broker;
pub use indicator::Indicator;
pub use market_data::MarketData;
pub use sinks::{NullSink, SummaryPublisher, TradeRecorder};
