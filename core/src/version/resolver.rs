use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::{AnimationConfig, VersionEntry};
use crate::error::StageError;

use super::types::{InferenceOverrides, InferenceParams, VersionConfig};

/// Maps a version tag to a concrete [`VersionConfig`].
///
/// Built once from an immutable [`AnimationConfig`]; `resolve` is a pure
/// function of its arguments and never touches the filesystem.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    engine_dir: PathBuf,
    base: InferenceParams,
    versions: BTreeMap<String, VersionEntry>,
}

impl VersionResolver {
    pub fn new(cfg: &AnimationConfig) -> Self {
        Self {
            engine_dir: PathBuf::from(&cfg.engine_dir),
            base: cfg.inference,
            versions: cfg.versions.clone(),
        }
    }

    /// Supported tags in stable (sorted) order.
    pub fn supported(&self) -> Vec<String> {
        self.versions.keys().cloned().collect()
    }

    pub fn resolve(
        &self,
        version_tag: &str,
        overrides: &InferenceOverrides,
    ) -> Result<VersionConfig, StageError> {
        let entry =
            self.versions
                .get(version_tag)
                .ok_or_else(|| StageError::UnsupportedVersion {
                    requested: version_tag.to_string(),
                    supported: self.supported(),
                })?;

        if overrides.fps == Some(0) {
            return Err(StageError::InputInvalid(
                "frame rate must be a positive integer".into(),
            ));
        }

        let defaults = entry.inference.apply_to(self.base);
        let inference = overrides.apply_to(defaults);
        if inference.fps == 0 {
            return Err(StageError::InputInvalid(format!(
                "version {version_tag} is configured with a zero frame rate"
            )));
        }

        let model_directory = self.engine_dir.join(&entry.model_dir);
        Ok(VersionConfig {
            version_key: version_tag.to_string(),
            engine_version_tag: entry.version_arg.clone(),
            engine_dir: self.engine_dir.clone(),
            model_file: model_directory.join(&entry.model_file),
            config_file: model_directory.join(&entry.config_file),
            model_directory,
            inference,
        })
    }
}
