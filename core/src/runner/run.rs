use std::io::ErrorKind as IoErrorKind;
use std::time::{Duration, Instant};

use crate::error::StageError;
use crate::util::RingBytes;

use super::io_pump;
use super::traits::ToolRunner;
use super::types::{ToolCommand, ToolOutcome};

/// How long to keep draining pipes after the child is gone. Grandchildren that
/// inherited the pipes may keep them open indefinitely.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Longest stderr excerpt carried inside an error.
const STDERR_EXCERPT_BYTES: usize = 2048;

pub struct RunToolArgs<'a> {
    pub runner: &'a dyn ToolRunner,
    pub command: &'a ToolCommand,
    /// `None` waits forever.
    pub deadline: Option<Duration>,
    pub capture_bytes: usize,
}

/// Runs a tool to completion and normalizes the result: a missing program
/// becomes `ToolNotInstalled`, an expired deadline kills the child and becomes
/// `Timeout`, and any non-zero exit becomes `InvocationFailed` no matter what
/// the tool left on disk.
pub async fn run_tool(args: RunToolArgs<'_>) -> Result<ToolOutcome, StageError> {
    let RunToolArgs {
        runner,
        command,
        deadline,
        capture_bytes,
    } = args;
    let tool = command.tool.clone();

    tracing::debug!(
        tool = %tool,
        runner = runner.name(),
        command = %command.display(),
        "starting tool"
    );

    let mut session = runner
        .start_session(command)
        .await
        .map_err(|e| spawn_error(command, e))?;

    let ring_out = RingBytes::new(capture_bytes);
    let ring_err = RingBytes::new(capture_bytes);
    let out_task = session
        .stdout()
        .map(|rd| io_pump::pump_into_ring(rd, ring_out.clone(), "stdout"));
    let err_task = session
        .stderr()
        .map(|rd| io_pump::pump_into_ring(rd, ring_err.clone(), "stderr"));

    let started_at = Instant::now();

    let waited = match deadline {
        Some(limit) => match tokio::time::timeout(limit, session.wait()).await {
            Ok(res) => Some(res),
            Err(_) => None,
        },
        None => Some(session.wait().await),
    };

    let exit = match waited {
        Some(Ok(exit)) => exit,
        Some(Err(e)) => {
            drain(out_task, err_task).await;
            return Err(StageError::InvocationFailed {
                tool,
                exit_code: None,
                stderr_tail: format!("failed waiting for process: {e}"),
            });
        }
        None => {
            let after = deadline.unwrap_or_default();
            tracing::warn!(tool = %tool, after_secs = after.as_secs(), pid = ?session.pid(), "tool timed out, killing");
            if let Err(e) = session.kill().await {
                tracing::warn!(tool = %tool, error = %e, "kill after timeout failed");
            }
            let _ = tokio::time::timeout(DRAIN_GRACE, session.wait()).await;
            drain(out_task, err_task).await;
            return Err(StageError::Timeout { tool, after });
        }
    };

    drain(out_task, err_task).await;

    let duration_ms = started_at.elapsed().as_millis() as u64;
    let stderr_tail = ring_err.tail_string();
    let stdout_tail = ring_out.tail_string();

    tracing::debug!(tool = %tool, exit_code = ?exit.code, duration_ms, "tool exited");

    match exit.code {
        Some(0) => Ok(ToolOutcome {
            exit_code: 0,
            duration_ms,
            stdout_tail,
            stderr_tail,
        }),
        code => {
            // Some tools report failures on stdout only.
            let detail = if stderr_tail.is_empty() {
                stdout_tail
            } else {
                stderr_tail
            };
            Err(StageError::InvocationFailed {
                tool,
                exit_code: code,
                stderr_tail: excerpt(&detail),
            })
        }
    }
}

fn spawn_error(command: &ToolCommand, err: anyhow::Error) -> StageError {
    let program = command.program.to_string_lossy().into_owned();
    match err.downcast_ref::<std::io::Error>().map(|e| e.kind()) {
        Some(IoErrorKind::NotFound) => StageError::ToolNotInstalled {
            tool: command.tool.clone(),
            detail: format!("program not found: {program}"),
        },
        Some(IoErrorKind::PermissionDenied) => StageError::ToolNotInstalled {
            tool: command.tool.clone(),
            detail: format!("program not executable: {program}"),
        },
        _ => StageError::InvocationFailed {
            tool: command.tool.clone(),
            exit_code: None,
            stderr_tail: format!("failed to start {program}: {err:#}"),
        },
    }
}

async fn drain(
    out_task: Option<tokio::task::JoinHandle<u64>>,
    err_task: Option<tokio::task::JoinHandle<u64>>,
) {
    let pumps = [out_task, err_task].into_iter().flatten().map(|task| async move {
        let abort = task.abort_handle();
        if tokio::time::timeout(DRAIN_GRACE, task).await.is_err() {
            abort.abort();
        }
    });
    futures::future::join_all(pumps).await;
}

fn excerpt(s: &str) -> String {
    if s.len() <= STDERR_EXCERPT_BYTES {
        return s.to_string();
    }
    let mut start = s.len() - STDERR_EXCERPT_BYTES;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &s[start..])
}
