pub mod factory;
pub mod install;
pub mod runner;
pub mod services;
pub mod stage;
