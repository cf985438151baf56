use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::types::{ExitInfo, ToolCommand};

#[async_trait]
pub trait ToolSession: Send {
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn pid(&self) -> Option<u32> {
        None
    }
    async fn kill(&mut self) -> anyhow::Result<()>;
    async fn wait(&mut self) -> anyhow::Result<ExitInfo>;
}

/// Launches external tools. The production implementation spawns OS
/// processes; tests substitute runners that script the tool's behavior.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(&self, command: &ToolCommand) -> anyhow::Result<Box<dyn ToolSession>>;
}
