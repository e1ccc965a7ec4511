//! Daily price history types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily bar. The engine only ever reads `close`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Trading day
    pub date: NaiveDate,
    /// Closing price
    pub close: f64,
}

impl PriceBar {
    /// Create a new bar.
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    /// Close as money, rounded to 4 places. `None` for a non-finite close.
    pub fn close_decimal(&self) -> Option<Decimal> {
        Decimal::try_from(self.close).ok().map(|d| d.round_dp(4))
    }
}

/// Ascending, date-unique series of daily bars for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// Symbol identifier
    pub symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceHistory {
    /// Build a history from bars in any order.
    ///
    /// Bars are sorted by date; when a date appears more than once the
    /// last occurrence wins.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|b| b.date);

        let mut unique: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match unique.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => unique.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            bars: unique,
        }
    }

    /// Build a history from closes, assigning consecutive calendar days
    /// starting at `start`.
    pub fn from_closes(symbol: impl Into<String>, start: NaiveDate, closes: &[f64]) -> Self {
        let bars = closes
            .iter()
            .zip(start.iter_days())
            .map(|(&close, date)| PriceBar::new(date, close))
            .collect();
        Self::new(symbol, bars)
    }

    /// Number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the history is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// All bars, oldest first.
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&PriceBar> {
        self.bars.get(index)
    }

    /// Most recent bar.
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Most recent close.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Most recent close as money.
    pub fn last_close_decimal(&self) -> Option<Decimal> {
        self.bars.last().and_then(PriceBar::close_decimal)
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Keep only the trailing `n` bars.
    pub fn truncate_front(&mut self, n: usize) {
        let start = self.bars.len().saturating_sub(n);
        self.bars.drain(..start);
    }
}
