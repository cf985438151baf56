//! HTTP route handlers

use axum::{
    body::Body,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use talkhead_core::api::{GenerateRequest, InferenceOverrides};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::http::{
    models::*,
    state::AppState,
    validation::{parse_bbox_shift, parse_bool, parse_fps, validate_task_id, validate_upload},
};

pub fn create_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .http_server
        .max_upload_mb
        .saturating_mul(1024 * 1024);

    Router::new()
        .route("/generate", post(generate_handler))
        .route("/download/:task_id", get(download_handler))
        .route("/health", get(health_handler))
        .route("/api/v1/tasks/:task_id", get(task_status_handler))
        .route("/api/v1/shutdown", post(shutdown_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// POST /generate - run one task to completion
async fn generate_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>, HttpServerError> {
    state.record_request("/generate");

    let req = read_generate_form(&mut multipart).await?;

    // The pipeline gets its own task so a dropped connection does not cancel it.
    let pipeline = state.pipeline.clone();
    let outcome = tokio::spawn(async move { pipeline.run_pipeline(req).await })
        .await
        .map_err(|e| HttpServerError::Internal(format!("pipeline task aborted: {e}")))?;

    match outcome {
        Ok(outcome) => Ok(Json(GenerateResponse::for_task(outcome.task_id))),
        Err(e) => {
            state.record_error();
            Err(e.into())
        }
    }
}

fn form_error(e: MultipartError) -> HttpServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HttpServerError::PayloadTooLarge(e.body_text())
    } else {
        HttpServerError::InvalidRequest(format!("malformed form data: {}", e.body_text()))
    }
}

async fn read_generate_form(multipart: &mut Multipart) -> Result<GenerateRequest, HttpServerError> {
    let mut text = None;
    let mut image = None;
    let mut version = None;
    let mut overrides = InferenceOverrides::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => text = Some(field.bytes().await.map_err(form_error)?.to_vec()),
            "image" => image = Some(field.bytes().await.map_err(form_error)?.to_vec()),
            "version" | "fps" | "bbox_shift" | "use_float16" => {
                let value = field.text().await.map_err(form_error)?;
                let value = value.trim();
                // HTML forms submit untouched inputs as empty strings.
                if value.is_empty() {
                    continue;
                }
                match name.as_str() {
                    "version" => version = Some(value.to_string()),
                    "fps" => overrides.fps = Some(parse_fps(value)?),
                    "bbox_shift" => overrides.bbox_shift = Some(parse_bbox_shift(value)?),
                    _ => overrides.use_float16 = Some(parse_bool("use_float16", value)?),
                }
            }
            other => tracing::debug!(field = %other, "ignoring unknown form field"),
        }
    }

    let text = text.ok_or_else(|| HttpServerError::InvalidRequest("missing field 'text'".into()))?;
    let image =
        image.ok_or_else(|| HttpServerError::InvalidRequest("missing field 'image'".into()))?;
    validate_upload("text", &text)?;
    validate_upload("image", &image)?;

    Ok(GenerateRequest {
        text,
        image,
        version,
        overrides,
    })
}

/// GET /download/:task_id - final video of a finished task
async fn download_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    req: Request,
) -> Result<Response, HttpServerError> {
    state.record_request("/download");
    validate_task_id(&task_id)?;

    let path = state.pipeline.locate(&task_id).ok_or(HttpServerError::NotFound)?;

    let res = match ServeFile::new(&path).oneshot(req).await {
        Ok(res) => res,
        Err(never) => match never {},
    };
    let mut res = res.map(Body::new);
    if res.status().is_success() {
        let headers = res.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_static("attachment; filename=\"result.mp4\""),
        );
    }
    Ok(res)
}

/// GET /api/v1/tasks/:task_id - status of a task known to this process
async fn task_status_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskStatusResponse>, HttpServerError> {
    state.record_request("/api/v1/tasks");
    validate_task_id(&task_id)?;

    let record = state
        .pipeline
        .registry()
        .get(&task_id)
        .await
        .ok_or(HttpServerError::NotFound)?;
    Ok(Json(record.into()))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let (uptime_seconds, requests_handled) = state.snapshot();
    let tasks = state.pipeline.registry().stats().await;

    Json(HealthResponse {
        status: "healthy".into(),
        session_id: state.session_id.clone(),
        uptime_seconds,
        requests_handled,
        tasks: tasks.into(),
        timestamp: Local::now().to_rfc3339(),
    })
}

/// POST /api/v1/shutdown - trigger graceful shutdown
async fn shutdown_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let _ = state.shutdown_tx.send(());

    Json(serde_json::json!({
        "success": true,
        "message": "Shutdown signal sent"
    }))
}
