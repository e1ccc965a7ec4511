//! Evaluation pass orchestration.

mod orchestrator;
mod run_state;

pub use crossover_strategy::default_history_days;
pub use orchestrator::{Orchestrator, PassOutcome, Phase};
pub use run_state::{PassTally, RunState};
