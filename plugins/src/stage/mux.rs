use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use talkhead_core::api::{
    discard_file, move_file, require_artifact, roles, run_tool, MuxToolConfig, RunToolArgs, StageAdapter,
    StageConfig, StageError, StageInputs, StageResult, ToolCommand, ToolRunner, Workspace,
};

pub const TOOL: &str = "ffmpeg";

/// Combines the silent video with the synthesized audio: the video stream is
/// copied, audio is re-encoded, and the output ends with the shorter input.
pub struct MuxStage {
    runner: Arc<dyn ToolRunner>,
    program: String,
    audio_codec: String,
}

impl MuxStage {
    pub fn new(runner: Arc<dyn ToolRunner>, cfg: &MuxToolConfig) -> Self {
        Self {
            runner,
            program: cfg.program.clone(),
            audio_codec: cfg.audio_codec.clone(),
        }
    }

    pub fn command(&self, video: &Path, audio: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(TOOL, &self.program)
            .arg("-y")
            .path_arg("-i", video)
            .path_arg("-i", audio)
            .args(["-c:v", "copy"])
            .arg("-c:a")
            .arg(&self.audio_codec)
            .args(["-strict", "experimental", "-shortest"])
            .arg(output.as_os_str())
    }
}

/// ffmpeg writes to a sibling name first so a half-written file never sits at
/// the final path.
fn staging_path(output: &Path) -> PathBuf {
    output.with_extension("tmp.mp4")
}

#[async_trait]
impl StageAdapter for MuxStage {
    fn name(&self) -> &'static str {
        TOOL
    }

    async fn invoke(
        &self,
        inputs: &StageInputs,
        _workspace: &Workspace,
        config: &StageConfig,
    ) -> Result<StageResult, StageError> {
        let video = inputs.require(roles::VIDEO)?;
        let audio = inputs.require(roles::AUDIO)?;
        let staging = staging_path(inputs.output());

        let cmd = self.command(video, audio, &staging);
        let ran = run_tool(RunToolArgs {
            runner: self.runner.as_ref(),
            command: &cmd,
            deadline: config.deadline,
            capture_bytes: config.capture_bytes,
        })
        .await;

        let finished = match ran {
            Ok(_) => require_artifact(&staging).await,
            Err(e) => Err(e),
        };
        if let Err(e) = finished {
            discard_file(&staging).await;
            return Err(e);
        }

        move_file(&staging, inputs.output()).await?;
        Ok(StageResult::expected(inputs.output()))
    }
}
