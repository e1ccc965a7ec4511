//! Moving average indicators.

use serde::{Deserialize, Serialize};

use crossover_core::error::IndicatorError;
use crossover_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values. Output is aligned
/// with the input: the first `period - 1` entries are `None`, as is any
/// entry whose window contains a non-finite value.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "SMA period must be greater than 0".into(),
            ));
        }
        Ok(Self { period })
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        let mut result = vec![None; data.len()];
        if data.len() < self.period {
            return result;
        }

        let period_f64 = self.period as f64;
        for (offset, window) in data.windows(self.period).enumerate() {
            if window.iter().any(|v| !v.is_finite()) {
                continue;
            }
            // Mean taken relative to the first element so a flat window
            // averages to exactly that value.
            let base = window[0];
            let drift: f64 = window.iter().map(|v| v - base).sum();
            result[offset + self.period - 1] = Some(base + drift / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Validated short/long window lengths: both positive, `short < long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct MaWindows {
    short: usize,
    long: usize,
}

impl MaWindows {
    pub fn new(short: usize, long: usize) -> Result<Self, IndicatorError> {
        if short == 0 {
            return Err(IndicatorError::InvalidParameter(
                "short window must be greater than 0".into(),
            ));
        }
        if short >= long {
            return Err(IndicatorError::InvalidParameter(format!(
                "short window ({}) must be less than long window ({})",
                short, long
            )));
        }
        Ok(Self { short, long })
    }

    pub fn short(&self) -> usize {
        self.short
    }

    pub fn long(&self) -> usize {
        self.long
    }
}

impl TryFrom<(usize, usize)> for MaWindows {
    type Error = IndicatorError;

    fn try_from((short, long): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(short, long)
    }
}

impl From<MaWindows> for (usize, usize) {
    fn from(windows: MaWindows) -> Self {
        (windows.short, windows.long)
    }
}

/// Short and long SMAs over the same closes, index-aligned with them.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAveragePair {
    short: Vec<Option<f64>>,
    long: Vec<Option<f64>>,
    windows: MaWindows,
}

impl MovingAveragePair {
    /// Compute both averages.
    ///
    /// Fails with `InvalidParameter` when a window is zero or
    /// `short_window >= long_window`.
    pub fn compute(
        prices: &[f64],
        short_window: usize,
        long_window: usize,
    ) -> Result<Self, IndicatorError> {
        let windows = MaWindows::new(short_window, long_window)?;
        Ok(Self::with_windows(prices, windows))
    }

    /// Compute both averages for already-validated windows.
    pub fn with_windows(prices: &[f64], windows: MaWindows) -> Self {
        let short = Sma {
            period: windows.short,
        };
        let long = Sma {
            period: windows.long,
        };

        Self {
            short: short.calculate(prices),
            long: long.calculate(prices),
            windows,
        }
    }

    /// Number of points (equals the input length).
    pub fn len(&self) -> usize {
        self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty()
    }

    pub fn short(&self) -> &[Option<f64>] {
        &self.short
    }

    pub fn long(&self) -> &[Option<f64>] {
        &self.long
    }

    pub fn windows(&self) -> MaWindows {
        self.windows
    }

    /// `(short, long)` at `index`, each `None` where undefined.
    pub fn point(&self, index: usize) -> (Option<f64>, Option<f64>) {
        (
            self.short.get(index).copied().flatten(),
            self.long.get(index).copied().flatten(),
        )
    }

    /// `(short, long)` at the most recent index.
    pub fn latest(&self) -> (Option<f64>, Option<f64>) {
        match self.len() {
            0 => (None, None),
            n => self.point(n - 1),
        }
    }
}

/// Length of the trailing run of finite values.
///
/// A series has enough data for a decision when this reaches the long
/// window, i.e. the latest long average is defined.
pub fn trailing_finite(prices: &[f64]) -> usize {
    prices.iter().rev().take_while(|v| v.is_finite()).count()
}
