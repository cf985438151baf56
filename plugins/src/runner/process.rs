use anyhow::Result;
use async_trait::async_trait;
use std::process::Stdio;
use talkhead_core::runner::{ExitInfo, ToolCommand, ToolRunner, ToolSession};
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};

/// Spawns tools as OS child processes. stdin is closed so no tool can block
/// waiting for input; the child is killed if its session is dropped.
pub struct ProcessRunner {}

impl ProcessRunner {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    fn name(&self) -> &str {
        "process"
    }

    async fn start_session(&self, command: &ToolCommand) -> Result<Box<dyn ToolSession>> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .envs(&command.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        tracing::debug!(tool = %command.tool, pid = ?child.id(), "spawned");
        Ok(Box::new(ProcessSession { child }))
    }
}

struct ProcessSession {
    child: Child,
}

#[async_trait]
impl ToolSession for ProcessSession {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn kill(&mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }

    async fn wait(&mut self) -> Result<ExitInfo> {
        let status = self.child.wait().await?;
        Ok(ExitInfo {
            code: status.code(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;
    use talkhead_core::api::{run_tool, ErrorKind, RunToolArgs, StageError};

    async fn run(cmd: ToolCommand, deadline: Option<Duration>) -> Result<i32, StageError> {
        let runner = ProcessRunner::new();
        run_tool(RunToolArgs {
            runner: &runner,
            command: &cmd,
            deadline,
            capture_bytes: 4096,
        })
        .await
        .map(|o| o.exit_code)
    }

    #[tokio::test]
    async fn missing_binary_is_not_installed() {
        let cmd = ToolCommand::new("tts", "/nonexistent/talkhead-tts-binary");
        let err = run(cmd, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolNotInstalled);
    }

    #[tokio::test]
    async fn stderr_tail_is_reported_on_failure() {
        let cmd = ToolCommand::new("ffmpeg", "sh")
            .arg("-c")
            .arg("echo 'Invalid data found' >&2; exit 3");
        match run(cmd, None).await.unwrap_err() {
            StageError::InvocationFailed {
                exit_code,
                stderr_tail,
                ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr_tail, "Invalid data found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sleeping_child_is_killed_at_deadline() {
        let cmd = ToolCommand::new("musetalk", "sleep").arg("30");
        let started = std::time::Instant::now();
        let err = run(cmd, Some(Duration::from_millis(200))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn clean_exit_succeeds() {
        let cmd = ToolCommand::new("tts", "sh").arg("-c").arg("exit 0");
        assert_eq!(run(cmd, None).await.unwrap(), 0);
    }
}
