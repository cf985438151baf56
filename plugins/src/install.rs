//! Installation check for the animation engine tree.
use std::path::PathBuf;

use serde::Serialize;
use talkhead_core::api::{AnimationConfig, InferenceOverrides, StageError, VersionResolver};

#[derive(Debug, Clone, Serialize)]
pub struct InstallItem {
    pub label: &'static str,
    pub path: PathBuf,
    pub present: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub engine_dir: PathBuf,
    pub items: Vec<InstallItem>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|i| i.present)
    }

    pub fn missing(&self) -> impl Iterator<Item = &InstallItem> {
        self.items.iter().filter(|i| !i.present)
    }
}

/// Checks every file and directory the engine needs for `version`. Unlike the
/// adapter's own preflight this reports all missing items, not just the first.
pub fn check_installation(
    cfg: &AnimationConfig,
    version: &str,
) -> Result<InstallReport, StageError> {
    let resolved = VersionResolver::new(cfg).resolve(version, &InferenceOverrides::default())?;
    let engine = &resolved.engine_dir;

    let dir = |label, path: PathBuf| InstallItem {
        present: path.is_dir(),
        label,
        path,
    };
    let file = |label, path: PathBuf| InstallItem {
        present: path.is_file(),
        label,
        path,
    };

    let items = vec![
        dir("engine directory", engine.clone()),
        dir("configs directory", engine.join("configs")),
        dir("scripts directory", engine.join("scripts")),
        file("entry script", engine.join(&cfg.entry_script)),
        dir("model directory", resolved.model_directory.clone()),
        file("model file", resolved.model_file.clone()),
        file("model config", resolved.config_file.clone()),
        file(
            "inference config",
            engine.join("configs").join("inference").join("test.yaml"),
        ),
    ];

    Ok(InstallReport {
        version: resolved.version_key,
        engine_dir: engine.clone(),
        items,
    })
}
