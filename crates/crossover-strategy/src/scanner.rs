//! Historical crossover scanner.
//!
//! Looks back over the last `lookback` bars of each symbol for the most
//! recent golden (optionally also death) cross and ranks the hits by age.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crossover_core::error::StrategyError;
use crossover_core::types::PriceHistory;
use crossover_indicators::{
    most_recent_matching, trailing_finite, CrossoverEvent, MaWindows, MovingAveragePair,
};

/// A recent crossover found by the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanHit {
    pub symbol: String,
    pub event: CrossoverEvent,
    pub days_ago: usize,
    pub crossover_date: NaiveDate,
    /// Latest close
    pub current_price: f64,
    /// Latest short average
    pub short_ma: f64,
    /// Latest long average
    pub long_ma: f64,
}

/// Where the short average sits relative to the long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Above,
    Below,
    Level,
}

/// Result of scanning one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    Hit(ScanHit),
    /// No qualifying cross inside the lookback
    NoRecentCross { trend: Trend },
    InsufficientData { required: usize, available: usize },
}

/// Scans histories for recent crosses.
#[derive(Debug, Clone)]
pub struct CrossoverScanner {
    windows: MaWindows,
    lookback: usize,
    include_death: bool,
}

impl CrossoverScanner {
    pub fn new(short_window: usize, long_window: usize, lookback: usize) -> Result<Self, StrategyError> {
        if lookback == 0 {
            return Err(StrategyError::InvalidConfig(
                "lookback must be at least 1".into(),
            ));
        }
        Ok(Self {
            windows: MaWindows::new(short_window, long_window)?,
            lookback,
            include_death: false,
        })
    }

    /// Also report death crosses.
    pub fn with_death_crosses(mut self, include: bool) -> Self {
        self.include_death = include;
        self
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn scan(&self, history: &PriceHistory) -> Result<ScanOutcome, StrategyError> {
        let closes = history.closes();
        let available = trailing_finite(&closes);
        if available < self.windows.long() {
            return Ok(ScanOutcome::InsufficientData {
                required: self.windows.long(),
                available,
            });
        }

        let pair = MovingAveragePair::with_windows(&closes, self.windows);
        let (Some(short_ma), Some(long_ma)) = pair.latest() else {
            return Ok(ScanOutcome::InsufficientData {
                required: self.windows.long(),
                available,
            });
        };

        let include_death = self.include_death;
        let hit = most_recent_matching(&pair, self.lookback, |event| {
            event == CrossoverEvent::Golden || include_death
        })?;

        let outcome = match hit.and_then(|hit| Some((hit, history.get(hit.index)?))) {
            Some((hit, bar)) => ScanOutcome::Hit(ScanHit {
                symbol: history.symbol.clone(),
                event: hit.event,
                days_ago: hit.days_ago,
                crossover_date: bar.date,
                current_price: closes[closes.len() - 1],
                short_ma,
                long_ma,
            }),
            None => ScanOutcome::NoRecentCross {
                trend: if short_ma > long_ma {
                    Trend::Above
                } else if short_ma < long_ma {
                    Trend::Below
                } else {
                    Trend::Level
                },
            },
        };

        Ok(outcome)
    }
}

/// Sort hits most recent first. Ties keep their scan order.
pub fn rank(hits: &mut [ScanHit]) {
    hits.sort_by_key(|hit| hit.days_ago);
}

/// Most recent golden cross among ranked hits.
pub fn recommendation(ranked: &[ScanHit]) -> Option<&ScanHit> {
    ranked
        .iter()
        .find(|hit| hit.event == CrossoverEvent::Golden)
}
