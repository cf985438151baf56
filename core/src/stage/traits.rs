use async_trait::async_trait;

use crate::error::StageError;
use crate::workspace::Workspace;

use super::types::{StageConfig, StageInputs, StageResult};

/// One external stage (synthesis, animation, muxing) behind a uniform
/// `(inputs) -> output_file` contract.
///
/// Implementors provide [`StageAdapter::invoke`]; callers use
/// [`StageAdapter::run`], which performs the shared precondition check so no
/// process is ever spawned for a missing input.
#[async_trait]
pub trait StageAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn invoke(
        &self,
        inputs: &StageInputs,
        workspace: &Workspace,
        config: &StageConfig,
    ) -> Result<StageResult, StageError>;

    async fn run(
        &self,
        inputs: &StageInputs,
        workspace: &Workspace,
        config: &StageConfig,
    ) -> Result<StageResult, StageError> {
        inputs.check_exist()?;

        tracing::debug!(stage = self.name(), task_id = %workspace.task_id(), "invoking");
        match self.invoke(inputs, workspace, config).await {
            Ok(result) => {
                tracing::debug!(
                    stage = self.name(),
                    task_id = %workspace.task_id(),
                    output = %result.output_path.display(),
                    resolution = result.resolution_method.as_str(),
                    "succeeded"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::debug!(stage = self.name(), task_id = %workspace.task_id(), error = %e, "failed");
                Err(e)
            }
        }
    }
}
