use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::state::TaskStatus;

/// Flat failure taxonomy shared by every stage and by the task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputMissing,
    InputInvalid,
    ResourceError,
    UnsupportedVersion,
    ToolNotInstalled,
    InvocationFailed,
    OutputMissing,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InputMissing => "input_missing",
            Self::InputInvalid => "input_invalid",
            Self::ResourceError => "resource_error",
            Self::UnsupportedVersion => "unsupported_version",
            Self::ToolNotInstalled => "tool_not_installed",
            Self::InvocationFailed => "invocation_failed",
            Self::OutputMissing => "output_missing",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by the workspace manager, the version resolver or a stage adapter.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("input missing: {}", .path.display())]
    InputMissing { path: PathBuf },

    #[error("input invalid: {0}")]
    InputInvalid(String),

    #[error("cannot prepare {}: {source}", .path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported version '{requested}' (supported: {})", .supported.join(", "))]
    UnsupportedVersion {
        requested: String,
        supported: Vec<String>,
    },

    #[error("{tool} is not installed: {detail}")]
    ToolNotInstalled { tool: String, detail: String },

    #[error("{tool} exited with {}: {stderr_tail}", .exit_code.map(|c| c.to_string()).unwrap_or_else(|| "signal".into()))]
    InvocationFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr_tail: String,
    },

    #[error("no output produced at {} (result dir listing: [{}])", .expected.display(), .listing.join(", "))]
    OutputMissing {
        expected: PathBuf,
        listing: Vec<String>,
    },

    #[error("{tool} timed out after {}s", .after.as_secs())]
    Timeout { tool: String, after: Duration },
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputMissing { .. } => ErrorKind::InputMissing,
            Self::InputInvalid(_) => ErrorKind::InputInvalid,
            Self::Resource { .. } => ErrorKind::ResourceError,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::ToolNotInstalled { .. } => ErrorKind::ToolNotInstalled,
            Self::InvocationFailed { .. } => ErrorKind::InvocationFailed,
            Self::OutputMissing { .. } => ErrorKind::OutputMissing,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Resource {
            path: path.into(),
            source,
        }
    }

    pub fn output_missing(expected: impl Into<PathBuf>) -> Self {
        Self::OutputMissing {
            expected: expected.into(),
            listing: Vec::new(),
        }
    }
}

/// A stage failure tagged with the task and the state the task was in when it failed.
#[derive(Error, Debug)]
#[error("task {} failed while {stage}: {source}", .task_id.as_deref().unwrap_or("<unallocated>"))]
pub struct PipelineError {
    pub task_id: Option<String>,
    pub stage: TaskStatus,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_version_lists_supported_set() {
        let err = StageError::UnsupportedVersion {
            requested: "v9.9".into(),
            supported: vec!["v1.0".into(), "v1.5".into()],
        };
        assert_eq!(err.kind(), ErrorKind::UnsupportedVersion);
        assert_eq!(
            err.to_string(),
            "unsupported version 'v9.9' (supported: v1.0, v1.5)"
        );
    }

    #[test]
    fn invocation_failed_without_code_reads_signal() {
        let err = StageError::InvocationFailed {
            tool: "ffmpeg".into(),
            exit_code: None,
            stderr_tail: "killed".into(),
        };
        assert_eq!(err.to_string(), "ffmpeg exited with signal: killed");
    }

    #[test]
    fn pipeline_error_carries_stage() {
        let err = PipelineError {
            task_id: Some("abc".into()),
            stage: TaskStatus::Merging,
            source: StageError::output_missing("/tmp/final.mp4"),
        };
        assert_eq!(err.kind(), ErrorKind::OutputMissing);
        assert!(err.to_string().starts_with("task abc failed while merging"));
    }
}
