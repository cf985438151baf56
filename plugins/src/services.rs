//! StagesFactory implementation: builds the process-backed stage adapters from
//! configuration for the CLI.
use talkhead_core::api::{AppConfig, StageSet, StagesFactory};

use crate::factory;

pub struct PluginStagesFactory;

impl Default for PluginStagesFactory {
    fn default() -> Self {
        Self
    }
}

impl StagesFactory for PluginStagesFactory {
    fn build_stages(&self, cfg: &AppConfig) -> anyhow::Result<StageSet> {
        factory::build_stages(cfg)
    }
}
