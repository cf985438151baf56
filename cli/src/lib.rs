//! talkhead-cli library: exposes modules for unit and route tests

pub mod app;
pub mod commands;
pub mod http;
