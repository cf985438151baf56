//! Task record and lifecycle event types.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Pipeline state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Created,
    Synthesizing,
    Animating,
    Merging,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Synthesizing => "synthesizing",
            Self::Animating => "animating",
            Self::Merging => "merging",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a task: the state it was in and what went wrong.
#[derive(Debug, Clone, Serialize)]
pub struct TaskFailure {
    pub stage: TaskStatus,
    pub kind: ErrorKind,
    pub message: String,
}

/// In-memory record of one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub workspace_path: PathBuf,
    pub status: TaskStatus,
    /// Present iff `status == Failed`.
    pub error: Option<TaskFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(task_id: String, workspace_path: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            workspace_path,
            status: TaskStatus::Created,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.status, TaskStatus::Done | TaskStatus::Failed)
    }

    pub fn duration_ms(&self) -> u64 {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        (end - self.created_at).num_milliseconds().max(0) as u64
    }
}

/// Lifecycle events broadcast by the task registry.
#[derive(Debug, Clone, Serialize)]
pub enum TaskEvent {
    TaskCreated {
        task_id: String,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        task_id: String,
        old_status: TaskStatus,
        new_status: TaskStatus,
        timestamp: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    TaskFailed {
        task_id: String,
        stage: TaskStatus,
        kind: ErrorKind,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> &str {
        match self {
            Self::TaskCreated { task_id, .. }
            | Self::StatusChanged { task_id, .. }
            | Self::TaskCompleted { task_id, .. }
            | Self::TaskFailed { task_id, .. } => task_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::TaskCreated { timestamp, .. }
            | Self::StatusChanged { timestamp, .. }
            | Self::TaskCompleted { timestamp, .. }
            | Self::TaskFailed { timestamp, .. } => *timestamp,
        }
    }
}
