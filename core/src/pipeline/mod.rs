//! Pipeline orchestration: the per-task state machine that chains the stage
//! adapters.
mod orchestrator;
mod types;

pub use orchestrator::Pipeline;
pub use types::{GenerateRequest, StageReport, StageSet, StageTimeouts, TaskOutcome};
