use std::sync::Arc;

use anyhow::Result;

use talkhead_core::api::{AppConfig, StageSet, ToolRunner};

use crate::runner::ProcessRunner;
use crate::stage::{AnimationStage, MuxStage, TtsStage};

pub fn build_runner(_cfg: &AppConfig) -> Arc<dyn ToolRunner> {
    Arc::new(ProcessRunner::new())
}

pub fn build_stages_with_runner(cfg: &AppConfig, runner: Arc<dyn ToolRunner>) -> StageSet {
    StageSet {
        synthesis: Arc::new(TtsStage::new(runner.clone(), &cfg.tools.tts)),
        animation: Arc::new(AnimationStage::new(runner.clone(), &cfg.animation)),
        merge: Arc::new(MuxStage::new(runner, &cfg.tools.mux)),
    }
}

pub fn build_stages(cfg: &AppConfig) -> Result<StageSet> {
    if cfg.tools.tts.program.trim().is_empty() {
        anyhow::bail!("tools.tts.program must not be empty");
    }
    if cfg.tools.mux.program.trim().is_empty() {
        anyhow::bail!("tools.mux.program must not be empty");
    }
    if !cfg.animation.versions.contains_key(&cfg.animation.default_version) {
        anyhow::bail!(
            "animation.default_version '{}' is not one of the configured versions",
            cfg.animation.default_version
        );
    }
    Ok(build_stages_with_runner(cfg, build_runner(cfg)))
}
