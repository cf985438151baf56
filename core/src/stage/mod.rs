//! Stage adapters: the uniform seam in front of each external tool.
mod resolve;
mod traits;
mod types;

pub use resolve::{
    discard_dir, discard_file, list_tree, move_file, require_artifact, resolve_video_output, CANONICAL_RESULT,
};
pub use traits::StageAdapter;
pub use types::{roles, ResolutionMethod, StageConfig, StageInputs, StageResult};
