//! Task state machine rules.

use super::types::TaskStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("Cannot transition from terminal state {state}")]
    FromTerminalState { state: TaskStatus },
}

pub struct StateTransition;

impl StateTransition {
    /// Only forward single steps along the fixed stage order, or into `Failed`.
    pub fn validate(from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        if Self::is_terminal(from) {
            return Err(TransitionError::FromTerminalState { state: from });
        }

        let is_valid = to == TaskStatus::Failed || Self::next_status(from) == Some(to);

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    pub fn next_status(current: TaskStatus) -> Option<TaskStatus> {
        match current {
            TaskStatus::Created => Some(TaskStatus::Synthesizing),
            TaskStatus::Synthesizing => Some(TaskStatus::Animating),
            TaskStatus::Animating => Some(TaskStatus::Merging),
            TaskStatus::Merging => Some(TaskStatus::Done),
            TaskStatus::Done | TaskStatus::Failed => None,
        }
    }

    pub fn is_terminal(status: TaskStatus) -> bool {
        matches!(status, TaskStatus::Done | TaskStatus::Failed)
    }

    pub fn status_description(status: TaskStatus) -> &'static str {
        match status {
            TaskStatus::Created => "workspace allocated",
            TaskStatus::Synthesizing => "synthesizing speech",
            TaskStatus::Animating => "animating face",
            TaskStatus::Merging => "merging audio and video",
            TaskStatus::Done => "finished",
            TaskStatus::Failed => "failed",
        }
    }
}
