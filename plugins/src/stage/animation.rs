use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use talkhead_core::api::{
    discard_dir, resolve_video_output, roles, run_tool, AnimationConfig, RunToolArgs,
    StageAdapter, StageConfig, StageError, StageInputs, StageResult, ToolCommand, ToolRunner,
    VersionConfig, Workspace,
};

pub const TOOL: &str = "musetalk";

/// Lip-sync animation through the MuseTalk inference entry point.
///
/// MuseTalk writes into a result directory of its own choosing; the adapter
/// gives it a scratch directory inside the workspace, moves the produced video
/// to the requested output and discards the scratch directory either way.
pub struct AnimationStage {
    runner: Arc<dyn ToolRunner>,
    python: String,
    entry_script: String,
    cpu_only: bool,
}

impl AnimationStage {
    pub fn new(runner: Arc<dyn ToolRunner>, cfg: &AnimationConfig) -> Self {
        Self {
            runner,
            python: cfg.python.clone(),
            entry_script: cfg.entry_script.clone(),
            cpu_only: cfg.cpu_only,
        }
    }

    fn entry_point(&self, version: &VersionConfig) -> PathBuf {
        version.engine_dir.join(&self.entry_script)
    }

    /// Everything the engine loads at startup must already be on disk.
    fn preflight(&self, version: &VersionConfig) -> Result<(), StageError> {
        let not_installed = |what: &str, path: &Path| StageError::ToolNotInstalled {
            tool: TOOL.into(),
            detail: format!("{what} not found: {}", path.display()),
        };

        let entry = self.entry_point(version);
        if !entry.is_file() {
            return Err(not_installed("entry script", &entry));
        }
        if !version.model_directory.is_dir() {
            return Err(not_installed("model directory", &version.model_directory));
        }
        if !version.model_file.is_file() {
            return Err(not_installed("model file", &version.model_file));
        }
        if !version.config_file.is_file() {
            return Err(not_installed("model config", &version.config_file));
        }
        Ok(())
    }

    pub fn command(
        &self,
        image: &Path,
        audio: &Path,
        result_dir: &Path,
        version: &VersionConfig,
    ) -> ToolCommand {
        let mut cmd = ToolCommand::new(TOOL, &self.python)
            .env("PYTHONIOENCODING", "utf-8")
            .env("PYTHONUNBUFFERED", "1")
            .arg(self.entry_point(version).into_os_string())
            .arg("--inference");
        if self.cpu_only {
            cmd = cmd.arg("--cpu_only");
        }
        let params = version.inference;
        cmd = cmd
            .path_arg("--source_image", image)
            .path_arg("--driven_audio", audio)
            .path_arg("--result_dir", result_dir)
            .arg("--version")
            .arg(&version.engine_version_tag)
            .path_arg("--unet_model_path", &version.model_file)
            .path_arg("--unet_config", &version.config_file)
            .arg("--fps")
            .arg(params.fps.to_string())
            .arg("--bbox_shift")
            .arg(params.bbox_shift.to_string());
        if params.use_float16 {
            cmd = cmd.arg("--use_float16");
        }
        cmd
    }
}

#[async_trait]
impl StageAdapter for AnimationStage {
    fn name(&self) -> &'static str {
        TOOL
    }

    async fn invoke(
        &self,
        inputs: &StageInputs,
        workspace: &Workspace,
        config: &StageConfig,
    ) -> Result<StageResult, StageError> {
        let image = inputs.require(roles::IMAGE)?;
        let audio = inputs.require(roles::AUDIO)?;
        let version = config.version.as_ref().ok_or_else(|| {
            StageError::InputInvalid("animation requires a resolved engine version".into())
        })?;

        self.preflight(version)?;

        let result_dir = workspace.animation_result_dir();
        discard_dir(&result_dir).await;
        tokio::fs::create_dir_all(&result_dir)
            .await
            .map_err(|e| StageError::resource(&result_dir, e))?;

        let cmd = self.command(image, audio, &result_dir, version);
        let ran = run_tool(RunToolArgs {
            runner: self.runner.as_ref(),
            command: &cmd,
            deadline: config.deadline,
            capture_bytes: config.capture_bytes,
        })
        .await;

        let resolved = match ran {
            Ok(_) => resolve_video_output(&result_dir, inputs.output()).await,
            Err(e) => Err(e),
        };
        discard_dir(&result_dir).await;
        resolved
    }
}
