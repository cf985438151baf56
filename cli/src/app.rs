//! CLI assembly: applies command line overrides to the loaded config and runs
//! the one-shot commands.
use std::path::{Path, PathBuf};

use talkhead_core::api::{
    AppConfig, AppContext, CliError, GenerateRequest, InferenceOverrides, WorkspaceManager,
};
use talkhead_plugins::install::check_installation;

use crate::commands::cli::{Args, CheckArgs, GenerateArgs, LocateArgs};

/// Folds global flags into the loaded config. Relative paths are anchored at
/// the current directory, like the config file's own paths.
pub fn apply_overrides(mut cfg: AppConfig, args: &Args) -> Result<AppConfig, CliError> {
    if let Some(root) = &args.output_root {
        let cwd = std::env::current_dir()?;
        cfg.workspace.output_root = absolute(&cwd, root).to_string_lossy().into_owned();
    }
    Ok(cfg)
}

fn absolute(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

#[tracing::instrument(name = "cli.generate", skip_all)]
pub async fn run_generate(args: GenerateArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let text = match (&args.text, &args.text_file) {
        (Some(t), _) => t.clone().into_bytes(),
        (None, Some(path)) => std::fs::read(path)
            .map_err(|e| CliError::Command(format!("cannot read {}: {e}", path.display())))?,
        (None, None) => return Err(CliError::Command("one of --text or --text-file is required".into())),
    };
    let image = std::fs::read(&args.image)
        .map_err(|e| CliError::Command(format!("cannot read {}: {e}", args.image.display())))?;

    let req = GenerateRequest {
        text,
        image,
        version: args.version.clone(),
        overrides: InferenceOverrides {
            fps: args.fps,
            bbox_shift: args.bbox_shift,
            use_float16: args.use_float16,
        },
    };

    let pipeline = ctx.build_pipeline()?;
    let outcome = pipeline.run_pipeline(req).await?;

    let out = serde_json::json!({
        "task_id": outcome.task_id,
        "video_path": outcome.final_video,
        "version": outcome.version,
        "stages": outcome.stages,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&out).map_err(|e| CliError::Command(e.to_string()))?
    );
    Ok(0)
}

pub fn run_check(args: CheckArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let mut animation = ctx.cfg().animation.clone();
    if let Some(dir) = &args.dir {
        let cwd = std::env::current_dir()?;
        animation.engine_dir = absolute(&cwd, dir).to_string_lossy().into_owned();
    }
    let version = args
        .version
        .clone()
        .unwrap_or_else(|| animation.default_version.clone());

    let report =
        check_installation(&animation, &version).map_err(|e| CliError::Command(e.to_string()))?;

    println!(
        "Checking MuseTalk installation (version {}) at {}",
        report.version,
        report.engine_dir.display()
    );
    for item in &report.items {
        let mark = if item.present { "ok" } else { "MISSING" };
        println!("  [{mark:>7}] {}: {}", item.label, item.path.display());
    }

    if report.is_complete() {
        println!("Installation looks complete.");
        Ok(0)
    } else {
        tracing::warn!(
            version = %report.version,
            missing = report.missing().count(),
            "animation engine installation incomplete"
        );
        Ok(1)
    }
}

pub fn run_locate(args: LocateArgs, ctx: &AppContext) -> Result<i32, CliError> {
    let workspaces = WorkspaceManager::new(&ctx.cfg().workspace.output_root);
    match workspaces.locate_final(&args.task_id) {
        Some(path) => {
            println!("{}", path.display());
            Ok(0)
        }
        None => Err(CliError::NotFound(format!("no final video for task {}", args.task_id))),
    }
}
