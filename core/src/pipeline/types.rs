use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::PipelineConfig;
use crate::stage::{StageAdapter, StageResult};
use crate::state::TaskStatus;
use crate::version::InferenceOverrides;

/// One generation request as it arrives at the boundary.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Raw request text; must decode as UTF-8.
    pub text: Vec<u8>,
    pub image: Vec<u8>,
    /// Falls back to the configured default when absent.
    pub version: Option<String>,
    pub overrides: InferenceOverrides,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: TaskStatus,
    #[serde(flatten)]
    pub result: StageResult,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskOutcome {
    pub task_id: String,
    pub final_video: PathBuf,
    pub version: String,
    pub stages: Vec<StageReport>,
}

/// The three adapters, in execution order.
#[derive(Clone)]
pub struct StageSet {
    pub synthesis: Arc<dyn StageAdapter>,
    pub animation: Arc<dyn StageAdapter>,
    pub merge: Arc<dyn StageAdapter>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimeouts {
    pub synthesis: Option<Duration>,
    pub animation: Option<Duration>,
    pub merge: Option<Duration>,
}

impl StageTimeouts {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        let secs = |s: u64| (s > 0).then(|| Duration::from_secs(s));
        Self {
            synthesis: secs(cfg.synthesis_timeout_secs),
            animation: secs(cfg.animation_timeout_secs),
            merge: secs(cfg.merge_timeout_secs),
        }
    }
}
