//! Golden-cross / death-cross detection over a moving-average pair.

use serde::{Deserialize, Serialize};

use crate::moving_average::MovingAveragePair;
use crossover_core::error::IndicatorError;

/// Transition of the short average relative to the long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverEvent {
    /// Short crossed from below to above the long average
    Golden,
    /// Short crossed from above to below the long average
    Death,
    /// No strict sign change, or a point was undefined
    NoCross,
}

impl CrossoverEvent {
    pub fn is_cross(&self) -> bool {
        !matches!(self, CrossoverEvent::NoCross)
    }
}

impl std::fmt::Display for CrossoverEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrossoverEvent::Golden => write!(f, "GOLDEN CROSS"),
            CrossoverEvent::Death => write!(f, "DEATH CROSS"),
            CrossoverEvent::NoCross => write!(f, "NONE"),
        }
    }
}

/// Classify the transition between two consecutive `(short, long)` points.
///
/// Any undefined or non-finite input gives `NoCross`. Equality at either
/// point is never a cross.
pub fn classify(
    prev_short: Option<f64>,
    prev_long: Option<f64>,
    curr_short: Option<f64>,
    curr_long: Option<f64>,
) -> CrossoverEvent {
    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
    let (Some(ps), Some(pl), Some(cs), Some(cl)) = (
        finite(prev_short),
        finite(prev_long),
        finite(curr_short),
        finite(curr_long),
    ) else {
        return CrossoverEvent::NoCross;
    };

    if ps < pl && cs > cl {
        CrossoverEvent::Golden
    } else if ps > pl && cs < cl {
        CrossoverEvent::Death
    } else {
        CrossoverEvent::NoCross
    }
}

/// Transition from `index - 1` to `index`. `NoCross` for index 0.
pub fn crossover_at(pair: &MovingAveragePair, index: usize) -> CrossoverEvent {
    if index == 0 {
        return CrossoverEvent::NoCross;
    }
    let (ps, pl) = pair.point(index - 1);
    let (cs, cl) = pair.point(index);
    classify(ps, pl, cs, cl)
}

/// Transition into the most recent bar.
pub fn latest(pair: &MovingAveragePair) -> CrossoverEvent {
    match pair.len() {
        0 => CrossoverEvent::NoCross,
        n => crossover_at(pair, n - 1),
    }
}

/// A detected cross and where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossoverHit {
    pub event: CrossoverEvent,
    /// Bars between the cross and the most recent bar (0 = latest bar)
    pub days_ago: usize,
    /// Index of the bar the cross completed on
    pub index: usize,
}

/// Scan the most recent `lookback` adjacent pairs, newest first, and return
/// the first cross found.
///
/// `lookback = 1` only looks at the transition into the latest bar. A
/// lookback larger than the series is clamped.
pub fn most_recent_within(
    pair: &MovingAveragePair,
    lookback: usize,
) -> Result<Option<CrossoverHit>, IndicatorError> {
    most_recent_matching(pair, lookback, |event| event.is_cross())
}

/// Like [`most_recent_within`], but only stops on events accepted by `wanted`.
pub fn most_recent_matching(
    pair: &MovingAveragePair,
    lookback: usize,
    wanted: impl Fn(CrossoverEvent) -> bool,
) -> Result<Option<CrossoverHit>, IndicatorError> {
    if lookback == 0 {
        return Err(IndicatorError::InvalidParameter(
            "lookback must be at least 1".into(),
        ));
    }

    let len = pair.len();
    let hit = (1..len)
        .rev()
        .take(lookback)
        .map(|index| (index, crossover_at(pair, index)))
        .find(|(_, event)| event.is_cross() && wanted(*event))
        .map(|(index, event)| CrossoverHit {
            event,
            days_ago: len - 1 - index,
            index,
        });

    Ok(hit)
}

/// Every cross in the series, oldest first.
pub fn events(pair: &MovingAveragePair) -> Vec<CrossoverHit> {
    let len = pair.len();
    (1..len)
        .filter_map(|index| {
            let event = crossover_at(pair, index);
            event.is_cross().then_some(CrossoverHit {
                event,
                days_ago: len - 1 - index,
                index,
            })
        })
        .collect()
}
