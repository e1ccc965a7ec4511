//! Position-count limits.

use serde::{Deserialize, Serialize};

use crossover_core::error::StrategyError;

/// Fixed number of concurrent position slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionLimits {
    max_positions: usize,
}

impl PositionLimits {
    pub fn new(max_positions: usize) -> Result<Self, StrategyError> {
        if max_positions == 0 {
            return Err(StrategyError::InvalidConfig(
                "max positions must be at least 1".into(),
            ));
        }
        Ok(Self { max_positions })
    }

    pub fn max_positions(&self) -> usize {
        self.max_positions
    }

    pub fn is_full(&self, open_positions: usize) -> bool {
        open_positions >= self.max_positions
    }
}
