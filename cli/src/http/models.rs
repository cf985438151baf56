//! HTTP API data models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use talkhead_core::api::{ErrorKind, PipelineError, TaskRecord, TaskStats, TaskStatus};

// ============= Generate =============

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub task_id: String,
    pub video_url: String,
}

impl GenerateResponse {
    pub fn for_task(task_id: String) -> Self {
        Self {
            video_url: download_url(&task_id),
            task_id,
        }
    }
}

pub fn download_url(task_id: &str) -> String {
    format!("/download/{task_id}")
}

// ============= Task status =============

#[derive(Debug, Serialize)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl From<TaskRecord> for TaskStatusResponse {
    fn from(r: TaskRecord) -> Self {
        let video_url = (r.status == TaskStatus::Done).then(|| download_url(&r.task_id));
        Self {
            status: r.status.to_string(),
            failed_stage: r.error.as_ref().map(|e| e.stage.to_string()),
            error_kind: r.error.as_ref().map(|e| e.kind),
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
            video_url,
            task_id: r.task_id,
        }
    }
}

// ============= Health =============

#[derive(Debug, Serialize)]
pub struct TaskCounts {
    pub running: usize,
    pub done: usize,
    pub failed: usize,
}

impl From<TaskStats> for TaskCounts {
    fn from(s: TaskStats) -> Self {
        Self {
            running: s.running,
            done: s.done,
            failed: s.failed,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_id: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub tasks: TaskCounts,
    pub timestamp: String,
}

// ============= Errors =============

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
}

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    PayloadTooLarge(String),
    NotFound,
    Pipeline(PipelineError),
    Internal(String),
}

impl From<PipelineError> for HttpServerError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

impl HttpServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Pipeline(e) => match e.kind() {
                ErrorKind::InputMissing | ErrorKind::InputInvalid | ErrorKind::UnsupportedVersion => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::InvalidRequest(msg) | Self::PayloadTooLarge(msg) | Self::Internal(msg) => ErrorBody {
                error: msg,
                task_id: None,
                kind: None,
            },
            Self::NotFound => ErrorBody {
                error: "not found".into(),
                task_id: None,
                kind: None,
            },
            Self::Pipeline(e) => ErrorBody {
                error: e.to_string(),
                kind: Some(e.kind()),
                task_id: e.task_id,
            },
        };

        (status, Json(body)).into_response()
    }
}
