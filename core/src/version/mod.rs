//! Animation engine version table and per-request parameter merging.

mod resolver;
mod types;

pub use resolver::VersionResolver;
pub use types::{InferenceOverrides, InferenceParams, VersionConfig};
