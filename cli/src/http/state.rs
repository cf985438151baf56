//! Shared HTTP server state

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use talkhead_core::api::{AppConfig, Pipeline};
use tokio::sync::broadcast;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub session_id: String,
    pub pipeline: Pipeline,
    pub config: Arc<AppConfig>,
    pub stats: Arc<RwLock<ServerStats>>,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        session_id: String,
        pipeline: Pipeline,
        config: AppConfig,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            session_id,
            pipeline,
            config: Arc::new(config),
            stats: Arc::new(RwLock::new(ServerStats::new())),
            shutdown_tx,
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        let mut stats = self.stats.write().unwrap_or_else(|p| p.into_inner());
        stats.increment_request(endpoint);
    }

    pub fn record_error(&self) {
        let mut stats = self.stats.write().unwrap_or_else(|p| p.into_inner());
        stats.increment_error();
    }

    /// `(uptime_seconds, requests_total)`
    pub fn snapshot(&self) -> (f64, u64) {
        let stats = self.stats.read().unwrap_or_else(|p| p.into_inner());
        (stats.uptime_seconds(), stats.requests_total)
    }
}

pub struct ServerStats {
    pub requests_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub errors_total: u64,
    pub start_time: DateTime<Local>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            requests_total: 0,
            requests_by_endpoint: HashMap::new(),
            errors_total: 0,
            start_time: Local::now(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        let now = Local::now();
        (now - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
