#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use talkhead_core::api::{
    run_tool, AppConfig, ExitInfo, Pipeline, RunToolArgs, StageAdapter, StageConfig, StageError,
    StageInputs, StageResult, StageSet, TaskRegistry, ToolCommand, ToolRunner, ToolSession,
    VersionConfig, Workspace,
};

#[derive(Debug, Clone)]
pub struct Call {
    pub stage: &'static str,
    pub started: Instant,
    pub version: Option<VersionConfig>,
}

/// Shared record of every adapter invocation, in call order.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn called(&self, stage: &str) -> bool {
        self.calls().iter().any(|c| c.stage == stage)
    }

    pub fn started(&self, stage: &str) -> Instant {
        self.calls()
            .iter()
            .find(|c| c.stage == stage)
            .map(|c| c.started)
            .unwrap_or_else(|| panic!("{stage} was never called"))
    }

    fn record(&self, stage: &'static str, version: Option<VersionConfig>) {
        self.0.lock().unwrap().push(Call {
            stage,
            started: Instant::now(),
            version,
        });
    }
}

#[derive(Clone)]
pub enum Behavior {
    /// Write these bytes to the requested output.
    Produce(Vec<u8>),
    /// Report success without writing anything.
    ClaimSuccess,
    Fail(fn() -> StageError),
    /// Run a tool that never exits, under the stage deadline.
    Hang,
}

pub struct FakeStage {
    name: &'static str,
    behavior: Behavior,
    journal: Journal,
}

impl FakeStage {
    pub fn new(name: &'static str, behavior: Behavior, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            journal: journal.clone(),
        })
    }
}

#[async_trait]
impl StageAdapter for FakeStage {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn invoke(
        &self,
        inputs: &StageInputs,
        _workspace: &Workspace,
        config: &StageConfig,
    ) -> Result<StageResult, StageError> {
        self.journal.record(self.name, config.version.clone());
        match &self.behavior {
            Behavior::Produce(bytes) => {
                tokio::fs::write(inputs.output(), bytes).await.unwrap();
                Ok(StageResult::expected(inputs.output()))
            }
            Behavior::ClaimSuccess => Ok(StageResult::expected(inputs.output())),
            Behavior::Fail(make) => Err(make()),
            Behavior::Hang => {
                let cmd = ToolCommand::new(self.name, "hang");
                run_tool(RunToolArgs {
                    runner: &HangingRunner,
                    command: &cmd,
                    deadline: config.deadline,
                    capture_bytes: config.capture_bytes,
                })
                .await?;
                Ok(StageResult::expected(inputs.output()))
            }
        }
    }
}

/// A runner whose processes only exit once killed.
pub struct HangingRunner;

struct HangingSession {
    killed: bool,
}

#[async_trait]
impl ToolSession for HangingSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        None
    }
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        None
    }
    async fn kill(&mut self) -> anyhow::Result<()> {
        self.killed = true;
        Ok(())
    }
    async fn wait(&mut self) -> anyhow::Result<ExitInfo> {
        if self.killed {
            return Ok(ExitInfo { code: None });
        }
        std::future::pending().await
    }
}

#[async_trait]
impl ToolRunner for HangingRunner {
    fn name(&self) -> &str {
        "hanging"
    }
    async fn start_session(&self, _: &ToolCommand) -> anyhow::Result<Box<dyn ToolSession>> {
        Ok(Box::new(HangingSession { killed: false }))
    }
}

/// Routes pipeline logs through the test harness so they show up on failure.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("talkhead_core=debug")
        .with_test_writer()
        .try_init();
}

pub fn test_config(output_root: &Path) -> AppConfig {
    init_logging();
    let mut cfg = AppConfig::default();
    cfg.workspace.output_root = output_root.to_string_lossy().into_owned();
    cfg
}

pub fn pipeline_with(
    cfg: &AppConfig,
    synthesis: Behavior,
    animation: Behavior,
    merge: Behavior,
    journal: &Journal,
) -> Pipeline {
    let stages = StageSet {
        synthesis: FakeStage::new("synthesis", synthesis, journal),
        animation: FakeStage::new("animation", animation, journal),
        merge: FakeStage::new("merge", merge, journal),
    };
    Pipeline::new(cfg, stages, TaskRegistry::new())
}

pub fn happy_pipeline(cfg: &AppConfig, journal: &Journal) -> Pipeline {
    pipeline_with(
        cfg,
        Behavior::Produce(b"RIFF....WAVE".to_vec()),
        Behavior::Produce(b"silent-video".to_vec()),
        Behavior::Produce(b"final-video".to_vec()),
        journal,
    )
}

pub fn short_deadline(cfg: &mut AppConfig) -> Duration {
    cfg.pipeline.animation_timeout_secs = 1;
    Duration::from_secs(1)
}
