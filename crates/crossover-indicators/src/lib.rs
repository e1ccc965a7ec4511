//! Moving averages and crossover detection.
//!
//! This crate provides:
//! - An index-aligned Simple Moving Average and the short/long pair built from it
//! - Golden-cross / death-cross classification, for the latest bar or over a
//!   lookback window

pub mod crossover;
pub mod moving_average;

pub use crossover::{
    classify, crossover_at, events, latest, most_recent_matching, most_recent_within, CrossoverEvent,
    CrossoverHit,
};
pub use moving_average::{trailing_finite, MaWindows, MovingAveragePair, Sma};
