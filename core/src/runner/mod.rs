//! External tool invocation: spawning, output capture, deadlines and exit
//! status normalization.
mod io_pump;
mod run;
mod traits;
mod types;

pub use run::{run_tool, RunToolArgs};
pub use traits::{ToolRunner, ToolSession};
pub use types::{ExitInfo, ToolCommand, ToolOutcome};
