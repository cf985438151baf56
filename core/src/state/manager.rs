//! In-memory task registry.

use super::transitions::StateTransition;
use super::types::{TaskEvent, TaskFailure, TaskRecord, TaskStatus};
use crate::error::StageError;
use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

#[derive(Clone)]
pub struct TaskRegistry {
    inner: Arc<TaskRegistryInner>,
}

struct TaskRegistryInner {
    tasks: RwLock<HashMap<String, TaskRecord>>,
    event_tx: broadcast::Sender<TaskEvent>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(1000);

        Self {
            inner: Arc::new(TaskRegistryInner {
                tasks: RwLock::new(HashMap::new()),
                event_tx,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.event_tx.subscribe()
    }

    fn emit_event(&self, event: TaskEvent) {
        let _ = self.inner.event_tx.send(event);
    }

    pub async fn register(&self, task_id: &str, workspace_path: PathBuf) -> Result<()> {
        {
            let mut tasks = self.inner.tasks.write().await;
            if tasks.contains_key(task_id) {
                anyhow::bail!("task {task_id} already registered");
            }
            tasks.insert(
                task_id.to_string(),
                TaskRecord::new(task_id.to_string(), workspace_path),
            );
        }

        self.emit_event(TaskEvent::TaskCreated {
            task_id: task_id.to_string(),
            timestamp: Utc::now(),
        });

        Ok(())
    }

    pub async fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.inner.tasks.read().await.get(task_id).cloned()
    }

    pub async fn status(&self, task_id: &str) -> Option<TaskStatus> {
        self.inner.tasks.read().await.get(task_id).map(|t| t.status)
    }

    /// Moves a task one step along the stage order.
    pub async fn transition(&self, task_id: &str, new_status: TaskStatus) -> Result<()> {
        let old_status = {
            let mut tasks = self.inner.tasks.write().await;
            let task = tasks.get_mut(task_id).context("Task not found")?;
            let old_status = task.status;
            StateTransition::validate(old_status, new_status)?;
            task.status = new_status;
            task.updated_at = Utc::now();
            if new_status == TaskStatus::Done {
                task.completed_at = Some(task.updated_at);
            }
            old_status
        };

        self.emit_event(TaskEvent::StatusChanged {
            task_id: task_id.to_string(),
            old_status,
            new_status,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    pub async fn complete(&self, task_id: &str) -> Result<()> {
        self.transition(task_id, TaskStatus::Done).await?;
        let duration_ms = self
            .get(task_id)
            .await
            .map(|t| t.duration_ms())
            .unwrap_or_default();

        self.emit_event(TaskEvent::TaskCompleted {
            task_id: task_id.to_string(),
            duration_ms,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Records the absorbing `Failed(stage, error)` state.
    pub async fn fail(&self, task_id: &str, error: &StageError) -> Result<()> {
        let stage = {
            let mut tasks = self.inner.tasks.write().await;
            let task = tasks.get_mut(task_id).context("Task not found")?;
            let stage = task.status;
            StateTransition::validate(stage, TaskStatus::Failed)?;
            let now = Utc::now();
            task.status = TaskStatus::Failed;
            task.error = Some(TaskFailure {
                stage,
                kind: error.kind(),
                message: error.to_string(),
            });
            task.updated_at = now;
            task.completed_at = Some(now);
            stage
        };

        self.emit_event(TaskEvent::TaskFailed {
            task_id: task_id.to_string(),
            stage,
            kind: error.kind(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Drops finished tasks beyond the `keep_recent` most recently finished.
    /// Returns how many were removed.
    pub async fn cleanup_finished_tasks(&self, keep_recent: usize) -> usize {
        let mut tasks = self.inner.tasks.write().await;

        let mut finished: Vec<_> = tasks
            .values()
            .filter(|t| !t.is_active())
            .map(|t| (t.task_id.clone(), t.completed_at.unwrap_or(t.updated_at)))
            .collect();

        finished.sort_by(|a, b| b.1.cmp(&a.1));

        let to_remove: Vec<_> = finished
            .into_iter()
            .skip(keep_recent)
            .map(|(id, _)| id)
            .collect();

        let count = to_remove.len();
        for id in to_remove {
            tasks.remove(&id);
        }

        count
    }

    pub async fn stats(&self) -> TaskStats {
        let tasks = self.inner.tasks.read().await;
        let mut stats = TaskStats::default();

        for task in tasks.values() {
            if task.is_active() {
                stats.running += 1;
            } else if task.status == TaskStatus::Done {
                stats.done += 1;
            } else {
                stats.failed += 1;
            }
        }

        stats
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TaskStats {
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}
