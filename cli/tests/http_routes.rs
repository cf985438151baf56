use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::sync::broadcast;
use tower::ServiceExt;

use talkhead_cli::http::{routes::create_router, AppState};
use talkhead_core::api::{
    AppConfig, Pipeline, StageAdapter, StageConfig, StageError, StageInputs, StageResult,
    StageSet, TaskRegistry, Workspace,
};

const BOUNDARY: &str = "talkhead-test-boundary";

/// Writes fixed bytes to whatever output it is asked for.
struct WriteStage(&'static [u8]);

#[async_trait]
impl StageAdapter for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    async fn invoke(
        &self,
        inputs: &StageInputs,
        _workspace: &Workspace,
        _config: &StageConfig,
    ) -> Result<StageResult, StageError> {
        tokio::fs::write(inputs.output(), self.0).await.unwrap();
        Ok(StageResult::expected(inputs.output()))
    }
}

fn app(output_root: &std::path::Path) -> Router {
    let mut cfg = AppConfig::default();
    cfg.workspace.output_root = output_root.to_string_lossy().into_owned();
    let stages = StageSet {
        synthesis: Arc::new(WriteStage(b"RIFF....WAVE")),
        animation: Arc::new(WriteStage(b"silent-video")),
        merge: Arc::new(WriteStage(b"final-video")),
    };
    let pipeline = Pipeline::new(&cfg, stages, TaskRegistry::new());
    let (shutdown_tx, _) = broadcast::channel(1);
    create_router(AppState::new("test".into(), pipeline, cfg, shutdown_tx))
}

fn form(fields: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, data) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}\"\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/generate")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json(res: axum::response::Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn generate_then_download_returns_final_video() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    let res = app
        .clone()
        .oneshot(form(&[("text", "Hello".as_bytes()), ("image", b"\x89PNG")]))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    let task_id = body["task_id"].as_str().unwrap().to_string();
    assert_eq!(body["video_url"], format!("/download/{task_id}"));

    let res = app
        .clone()
        .oneshot(
            Request::get(format!("/download/{task_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "video/mp4");
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"final-video");

    let res = app
        .oneshot(
            Request::get(format!("/api/v1/tasks/{task_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res).await["status"], "done");
}

#[tokio::test]
async fn generate_without_image_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path())
        .oneshot(form(&[("text", b"Hello")]))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json(res).await["error"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn unsupported_version_is_bad_request_with_kind() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path())
        .oneshot(form(&[
            ("text", b"Hello"),
            ("image", b"\x89PNG"),
            ("version", b"v9.9"),
        ]))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json(res).await;
    assert_eq!(body["kind"], "unsupported_version");
    assert!(body["task_id"].is_string());
}

#[tokio::test]
async fn download_rejects_traversal_and_unknown_ids() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(dir.path());

    for uri in [
        "/download/..%2F..%2Fetc%2Fpasswd",
        "/download/6f1c1d2e-8a43-4b8e-9a3b-0c8f7b6a5d4e",
        "/api/v1/tasks/not-a-task",
    ] {
        let res = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn health_reports_task_counts() {
    let dir = tempfile::tempdir().unwrap();
    let res = app(dir.path())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["tasks"]["done"], 0);
}
