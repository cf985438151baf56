use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use talkhead_core::api::{
    require_artifact, roles, run_tool, RunToolArgs, StageAdapter, StageConfig, StageError,
    StageInputs, StageResult, ToolCommand, ToolRunner, TtsToolConfig, Workspace,
};

pub const TOOL: &str = "tts";

/// Text to speech through an external command. The argument template may
/// reference `{text_file}`, `{output}` and `{workspace}`.
pub struct TtsStage {
    runner: Arc<dyn ToolRunner>,
    program: String,
    script: Option<PathBuf>,
    args: Vec<String>,
}

impl TtsStage {
    pub fn new(runner: Arc<dyn ToolRunner>, cfg: &TtsToolConfig) -> Self {
        Self {
            runner,
            program: cfg.program.clone(),
            script: cfg.script.as_ref().map(PathBuf::from),
            args: cfg.args.clone(),
        }
    }

    fn command(&self, text_file: &Path, output: &Path, workspace: &Path) -> ToolCommand {
        let mut cmd = ToolCommand::new(TOOL, &self.program).env("PYTHONIOENCODING", "utf-8");
        if let Some(script) = &self.script {
            cmd = cmd.arg(script.as_os_str());
        }
        let text_file = text_file.to_string_lossy();
        let output = output.to_string_lossy();
        let workspace = workspace.to_string_lossy();
        cmd.args(self.args.iter().map(|a| {
            a.replace("{text_file}", &text_file)
                .replace("{output}", &output)
                .replace("{workspace}", &workspace)
        }))
    }
}

#[async_trait]
impl StageAdapter for TtsStage {
    fn name(&self) -> &'static str {
        TOOL
    }

    async fn invoke(
        &self,
        inputs: &StageInputs,
        workspace: &Workspace,
        config: &StageConfig,
    ) -> Result<StageResult, StageError> {
        let text_file = inputs.require(roles::TEXT)?;
        if let Some(script) = &self.script {
            if !script.is_file() {
                return Err(StageError::ToolNotInstalled {
                    tool: TOOL.into(),
                    detail: format!("script not found: {}", script.display()),
                });
            }
        }

        let cmd = self.command(text_file, inputs.output(), workspace.path());
        run_tool(RunToolArgs {
            runner: self.runner.as_ref(),
            command: &cmd,
            deadline: config.deadline,
            capture_bytes: config.capture_bytes,
        })
        .await?;

        require_artifact(inputs.output()).await?;
        Ok(StageResult::expected(inputs.output()))
    }
}
