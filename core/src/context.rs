use crate::config::AppConfig;
use crate::error::CliError;
use crate::pipeline::{Pipeline, StageSet};
use crate::state::TaskRegistry;
use std::sync::Arc;

/// Builds the concrete stage adapters from configuration. Implemented by the
/// plugins crate so core never names a real tool.
pub trait StagesFactory: Send + Sync {
    fn build_stages(&self, cfg: &AppConfig) -> anyhow::Result<StageSet>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    registry: TaskRegistry,
    stages_factory: Option<Arc<dyn StagesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, stages_factory: Option<Arc<dyn StagesFactory>>) -> Self {
        Self {
            cfg,
            registry: TaskRegistry::new(),
            stages_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Wires the configured adapters into a [`Pipeline`] sharing this
    /// context's task registry.
    pub fn build_pipeline(&self) -> Result<Pipeline, CliError> {
        let Some(factory) = self.stages_factory.as_ref() else {
            return Err(CliError::Config(
                "stages_factory missing (cannot build stage adapters)".into(),
            ));
        };
        let stages = factory
            .build_stages(&self.cfg)
            .map_err(|e| CliError::Config(format!("{e:#}")))?;
        Ok(Pipeline::new(&self.cfg, stages, self.registry.clone()))
    }
}
