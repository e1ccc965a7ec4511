//! Trading decisions for the crossover agent.
//!
//! This crate provides:
//! - The golden-cross sell and buy policies
//! - A historical scanner for recent crosses across a watchlist

mod golden_cross;
mod scanner;

pub use golden_cross::{
    default_history_days, BuyBudget, BuyDecision, GoldenCrossConfig, GoldenCrossStrategy,
    SellDecision,
};
pub use scanner::{rank, recommendation, CrossoverScanner, ScanHit, ScanOutcome, Trend};
