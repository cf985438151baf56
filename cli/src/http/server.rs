//! HTTP server lifecycle

use super::{
    middleware::{create_middleware_stack, request_logger},
    routes::create_router,
    AppState,
};
use crate::commands::cli::ServeArgs;
use axum::middleware;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use talkhead_core::api::{AppContext, CliError};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

const STATE_FILE: &str = "talkhead.state";

fn get_servers_dir() -> Result<PathBuf, CliError> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::Command("Cannot find home directory".to_string()))?;
    let servers_dir = home.join(".talkhead").join("servers");
    fs::create_dir_all(&servers_dir)
        .map_err(|e| CliError::Command(format!("Failed to create servers directory: {e}")))?;
    Ok(servers_dir)
}

fn write_state_file(session_id: &str, port: u16, host: &str) -> Result<PathBuf, CliError> {
    let state_file = get_servers_dir()?.join(STATE_FILE);

    let state = serde_json::json!({
        "session_id": session_id,
        "port": port,
        "pid": std::process::id(),
        "url": format!("http://{}:{}", host, port),
        "started_at": chrono::Local::now().to_rfc3339()
    });
    let body = serde_json::to_string_pretty(&state)
        .map_err(|e| CliError::Command(format!("Failed to encode state file: {e}")))?;

    fs::write(&state_file, body)
        .map_err(|e| CliError::Command(format!("Failed to write state file: {e}")))?;

    info!("State file written to: {}", state_file.display());
    Ok(state_file)
}

/// Handles `talkhead serve`.
pub async fn handle_serve(args: ServeArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let session_id = args
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Command line flags win over the config file.
    let config = &ctx.cfg().http_server;
    let host = args.host.unwrap_or_else(|| config.host.clone());
    let port = args.port.unwrap_or(config.port);
    let request_timeout = Duration::from_secs(config.request_timeout_secs);

    let pipeline = ctx.build_pipeline()?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(session_id.clone(), pipeline, ctx.cfg().clone(), shutdown_tx);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| CliError::Config(format!("invalid listen address {host}:{port}: {e}")))?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let state_file = write_state_file(&session_id, port, &host)?;

    info!(
        "Starting HTTP server on {}:{} (session: {})",
        host, port, session_id
    );
    let served = start_server(listener, state, request_timeout).await;

    if let Err(e) = fs::remove_file(&state_file) {
        warn!("Failed to remove state file: {}", e);
    } else {
        info!("State file removed: {}", state_file.display());
    }

    served?;
    Ok(0)
}

/// Serves until Ctrl+C, SIGTERM or `POST /api/v1/shutdown`.
pub async fn start_server(
    listener: tokio::net::TcpListener,
    state: AppState,
    request_timeout: Duration,
) -> Result<(), CliError> {
    let mut shutdown_rx = state.shutdown_tx.subscribe();

    let app = create_router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack(request_timeout));

    if let Ok(addr) = listener.local_addr() {
        info!("HTTP server listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                }
                _ = shutdown_rx.recv() => {
                    info!("Received shutdown signal from API");
                }
                _ = wait_for_sigterm() => {
                    info!("Received SIGTERM signal");
                }
            }

            info!("Starting graceful shutdown...");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("SIGTERM handler unavailable: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
