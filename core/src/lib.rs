pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod stage;
pub mod state;
pub mod util;
pub mod version;
pub mod workspace;
