//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `talkhead_core::api` instead of reaching into internal modules.

pub use crate::config::{
    get_data_dir, load_default, load_explicit, load_from_path, AnimationConfig, AppConfig, HttpServerConfig,
    LoggingConfig, MuxToolConfig, PipelineConfig, TtsToolConfig, VersionEntry,
};
pub use crate::context::{AppContext, StagesFactory};
pub use crate::error::{CliError, ErrorKind, PipelineError, StageError};
pub use crate::pipeline::{
    GenerateRequest, Pipeline, StageReport, StageSet, StageTimeouts, TaskOutcome,
};
pub use crate::runner::{run_tool, ExitInfo, RunToolArgs, ToolCommand, ToolOutcome, ToolRunner, ToolSession};
pub use crate::stage::{
    discard_dir, discard_file, list_tree, move_file, require_artifact, resolve_video_output, roles,
    ResolutionMethod, StageAdapter, StageConfig, StageInputs, StageResult, CANONICAL_RESULT,
};
pub use crate::state::{TaskEvent, TaskFailure, TaskRecord, TaskRegistry, TaskStats, TaskStatus};
pub use crate::version::{InferenceOverrides, InferenceParams, VersionConfig, VersionResolver};
pub use crate::workspace::{is_valid_task_id, Workspace, WorkspaceManager};
