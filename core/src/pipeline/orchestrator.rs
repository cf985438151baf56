use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppConfig;
use crate::error::{PipelineError, StageError};
use crate::stage::{self, roles, StageAdapter, StageConfig, StageInputs};
use crate::state::{TaskRegistry, TaskStatus};
use crate::version::VersionResolver;
use crate::workspace::{Workspace, WorkspaceManager};

use super::types::{GenerateRequest, StageReport, StageSet, StageTimeouts, TaskOutcome};

/// Runs requests through synthesis, animation and muxing, one workspace per
/// task. Cheap to clone; every request may run on its own tokio task.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    workspaces: WorkspaceManager,
    resolver: VersionResolver,
    stages: StageSet,
    registry: TaskRegistry,
    timeouts: StageTimeouts,
    default_version: String,
    capture_bytes: usize,
    keep_finished_tasks: usize,
}

impl Pipeline {
    pub fn new(cfg: &AppConfig, stages: StageSet, registry: TaskRegistry) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                workspaces: WorkspaceManager::new(&cfg.workspace.output_root),
                resolver: VersionResolver::new(&cfg.animation),
                stages,
                registry,
                timeouts: StageTimeouts::from_config(&cfg.pipeline),
                default_version: cfg.animation.default_version.clone(),
                capture_bytes: cfg.pipeline.capture_bytes,
                keep_finished_tasks: cfg.pipeline.keep_finished_tasks,
            }),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.inner.registry
    }

    /// Final video of a task that reached `done`, if it is still on disk.
    pub fn locate(&self, task_id: &str) -> Option<PathBuf> {
        self.inner.workspaces.locate_final(task_id)
    }

    /// Drives one task from `created` to `done`, or to `failed` at the first
    /// stage error. Nothing is rolled back or retried; partial artifacts stay
    /// in the workspace.
    #[tracing::instrument(
        name = "run_pipeline",
        skip_all,
        fields(task_id = tracing::field::Empty, version = tracing::field::Empty)
    )]
    pub async fn run_pipeline(&self, req: GenerateRequest) -> Result<TaskOutcome, PipelineError> {
        let inner = &self.inner;
        let started = Instant::now();

        let ws = inner
            .workspaces
            .create_workspace()
            .await
            .map_err(|source| PipelineError {
                task_id: None,
                stage: TaskStatus::Created,
                source,
            })?;
        tracing::Span::current().record("task_id", ws.task_id());

        if let Err(e) = inner
            .registry
            .register(ws.task_id(), ws.path().to_path_buf())
            .await
        {
            tracing::warn!(task_id = %ws.task_id(), error = %e, "task registration failed");
        }

        let version_tag = req
            .version
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(inner.default_version.as_str())
            .trim()
            .to_string();
        tracing::Span::current().record("version", version_tag.as_str());
        tracing::info!(task_id = %ws.task_id(), version = %version_tag, "task created");

        let result = self.drive(&ws, &req, &version_tag).await;

        let outcome = match result {
            Ok(stages) => {
                if let Err(e) = inner.registry.complete(ws.task_id()).await {
                    tracing::warn!(task_id = %ws.task_id(), error = %e, "registry completion failed");
                }
                tracing::info!(
                    task_id = %ws.task_id(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    output = %ws.final_video().display(),
                    "task done"
                );
                Ok(TaskOutcome {
                    task_id: ws.task_id().to_string(),
                    final_video: ws.final_video(),
                    version: version_tag,
                    stages,
                })
            }
            Err((stage, source)) => {
                if let Err(e) = inner.registry.fail(ws.task_id(), &source).await {
                    tracing::warn!(task_id = %ws.task_id(), error = %e, "registry failure record failed");
                }
                tracing::error!(
                    task_id = %ws.task_id(),
                    stage = %stage,
                    kind = %source.kind(),
                    error = %source,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "task failed"
                );
                Err(PipelineError {
                    task_id: Some(ws.task_id().to_string()),
                    stage,
                    source,
                })
            }
        };

        let evicted = inner
            .registry
            .cleanup_finished_tasks(inner.keep_finished_tasks)
            .await;
        if evicted > 0 {
            tracing::debug!(evicted, "finished tasks evicted from registry");
        }

        outcome
    }

    async fn drive(
        &self,
        ws: &Workspace,
        req: &GenerateRequest,
        version_tag: &str,
    ) -> Result<Vec<StageReport>, (TaskStatus, StageError)> {
        let inner = &self.inner;
        let at = |stage: TaskStatus| move |e: StageError| (stage, e);

        persist_inputs(ws, req)
            .await
            .map_err(at(TaskStatus::Created))?;

        let mut reports = Vec::with_capacity(3);

        // synthesizing
        self.advance(ws, TaskStatus::Synthesizing).await;
        let inputs = StageInputs::new(ws.tts_audio()).with(roles::TEXT, ws.input_text());
        let cfg = StageConfig::new(inner.timeouts.synthesis, inner.capture_bytes);
        reports.push(
            run_stage(&inner.stages.synthesis, TaskStatus::Synthesizing, &inputs, ws, &cfg)
                .await
                .map_err(at(TaskStatus::Synthesizing))?,
        );

        // animating
        self.advance(ws, TaskStatus::Animating).await;
        let version = inner
            .resolver
            .resolve(version_tag, &req.overrides)
            .map_err(at(TaskStatus::Animating))?;
        tracing::debug!(
            task_id = %ws.task_id(),
            version = %version.version_key,
            fps = version.inference.fps,
            bbox_shift = version.inference.bbox_shift,
            use_float16 = version.inference.use_float16,
            "version resolved"
        );
        let inputs = StageInputs::new(ws.animation_video())
            .with(roles::IMAGE, ws.input_image())
            .with(roles::AUDIO, ws.tts_audio());
        let cfg = StageConfig::new(inner.timeouts.animation, inner.capture_bytes).with_version(version);
        reports.push(
            run_stage(&inner.stages.animation, TaskStatus::Animating, &inputs, ws, &cfg)
                .await
                .map_err(at(TaskStatus::Animating))?,
        );

        // merging
        self.advance(ws, TaskStatus::Merging).await;
        let inputs = StageInputs::new(ws.final_video())
            .with(roles::VIDEO, ws.animation_video())
            .with(roles::AUDIO, ws.tts_audio());
        let cfg = StageConfig::new(inner.timeouts.merge, inner.capture_bytes);
        reports.push(
            run_stage(&inner.stages.merge, TaskStatus::Merging, &inputs, ws, &cfg)
                .await
                .map_err(at(TaskStatus::Merging))?,
        );

        Ok(reports)
    }

    async fn advance(&self, ws: &Workspace, status: TaskStatus) {
        if let Err(e) = self.inner.registry.transition(ws.task_id(), status).await {
            tracing::warn!(task_id = %ws.task_id(), status = %status, error = %e, "registry transition failed");
        }
        tracing::info!(task_id = %ws.task_id(), stage = %status, "stage started");
    }
}

/// Runs one adapter and insists on a non-empty artifact at the requested
/// path, whatever the adapter reported.
async fn run_stage(
    adapter: &Arc<dyn StageAdapter>,
    stage: TaskStatus,
    inputs: &StageInputs,
    ws: &Workspace,
    cfg: &StageConfig,
) -> Result<StageReport, StageError> {
    let started = Instant::now();
    let result = adapter.run(inputs, ws, cfg).await?;
    stage::require_artifact(inputs.output()).await?;

    let duration_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        task_id = %ws.task_id(),
        stage = %stage,
        tool = adapter.name(),
        duration_ms,
        resolution = result.resolution_method.as_str(),
        "stage finished"
    );

    Ok(StageReport {
        stage,
        result,
        duration_ms,
    })
}

async fn persist_inputs(ws: &Workspace, req: &GenerateRequest) -> Result<(), StageError> {
    let text_path = ws.input_text();
    tokio::fs::write(&text_path, &req.text)
        .await
        .map_err(|e| StageError::resource(&text_path, e))?;
    let image_path = ws.input_image();
    tokio::fs::write(&image_path, &req.image)
        .await
        .map_err(|e| StageError::resource(&image_path, e))?;

    // Decoding is the only check; content is the tools' business.
    std::str::from_utf8(&req.text)
        .map_err(|e| StageError::InputInvalid(format!("text is not valid UTF-8: {e}")))?;
    Ok(())
}
