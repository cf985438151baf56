use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::StageError;
use crate::version::VersionConfig;

/// Input role names used by the built-in adapters.
pub mod roles {
    pub const TEXT: &str = "text";
    pub const IMAGE: &str = "image";
    pub const AUDIO: &str = "audio";
    pub const VIDEO: &str = "video";
}

/// How a stage located its artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    ExpectedName,
    FallbackScan,
}

impl ResolutionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExpectedName => "expected_name",
            Self::FallbackScan => "fallback_scan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub output_path: PathBuf,
    pub resolution_method: ResolutionMethod,
}

impl StageResult {
    pub fn expected(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            resolution_method: ResolutionMethod::ExpectedName,
        }
    }
}

/// Declared input files plus the path the stage must produce.
#[derive(Debug, Clone)]
pub struct StageInputs {
    inputs: Vec<(&'static str, PathBuf)>,
    output: PathBuf,
}

impl StageInputs {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.into(),
        }
    }

    pub fn with(mut self, role: &'static str, path: impl Into<PathBuf>) -> Self {
        self.inputs.push((role, path.into()));
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn get(&self, role: &str) -> Option<&Path> {
        self.inputs
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, p)| p.as_path())
    }

    /// The path bound to `role`; an adapter asking for an undeclared role is a
    /// wiring mistake reported as invalid input.
    pub fn require(&self, role: &str) -> Result<&Path, StageError> {
        self.get(role)
            .ok_or_else(|| StageError::InputInvalid(format!("no '{role}' input was supplied")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Path)> {
        self.inputs.iter().map(|(r, p)| (*r, p.as_path()))
    }

    /// Fails with `InputMissing` on the first declared path that does not exist.
    pub fn check_exist(&self) -> Result<(), StageError> {
        for (_, path) in self.iter() {
            if !path.exists() {
                return Err(StageError::InputMissing {
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }
}

/// Per-invocation knobs handed to an adapter by the orchestrator.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub deadline: Option<Duration>,
    pub capture_bytes: usize,
    /// Present only for the animation stage.
    pub version: Option<VersionConfig>,
}

impl StageConfig {
    pub fn new(deadline: Option<Duration>, capture_bytes: usize) -> Self {
        Self {
            deadline,
            capture_bytes,
            version: None,
        }
    }

    pub fn with_version(mut self, version: VersionConfig) -> Self {
        self.version = Some(version);
        self
    }
}
