//! Core types and traits for the crossover agent.
//!
//! This crate provides the foundational building blocks including:
//! - Price history types (PriceBar, PriceHistory)
//! - Positions, account snapshots, trade intents and run summaries
//! - Collaborator traits for the broker, market data and reporting sinks

pub mod types;
pub mod traits;
pub mod error;

pub use error::{AgentError, AgentResult};
pub use types::*;
pub use traits::*;
