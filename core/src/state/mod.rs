//! # Task state
//!
//! Every request becomes one task that walks a fixed state machine:
//! `Created → Synthesizing → Animating → Merging → Done`, with `Failed`
//! reachable from any non-terminal state. The registry keeps the records in
//! memory and broadcasts lifecycle events; the workspace directory on disk is
//! the durable state.

pub mod manager;
pub mod transitions;
pub mod types;

pub use manager::{TaskRegistry, TaskStats};
pub use transitions::{StateTransition, TransitionError};
pub use types::{TaskEvent, TaskFailure, TaskRecord, TaskStatus};
