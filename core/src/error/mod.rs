#[allow(clippy::module_inception)]
pub mod error;
pub mod stage;

pub use error::CliError;
pub use stage::{ErrorKind, PipelineError, StageError};
