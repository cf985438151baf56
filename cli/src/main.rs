use clap::Parser;
use std::sync::Arc;
use talkhead_cli::{app, commands::cli, http};
use talkhead_core::api::{AppContext, CliError, ErrorKind, LoggingConfig, TaskEvent};
use talkhead_plugins::services::PluginStagesFactory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();

    let cfg = match &args.config {
        Some(path) => talkhead_core::api::load_explicit(path),
        None => talkhead_core::api::load_default(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;
    let cfg = app::apply_overrides(cfg, &args)?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;

    let ctx = AppContext::new(cfg, Some(Arc::new(PluginStagesFactory)));

    let mut event_rx = ctx.registry().subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            match event {
                TaskEvent::TaskCreated { task_id, .. } => {
                    tracing::debug!("Task created: {}", task_id);
                }
                TaskEvent::StatusChanged {
                    task_id,
                    new_status,
                    ..
                } => {
                    tracing::debug!("Task {} -> {}", task_id, new_status);
                }
                TaskEvent::TaskCompleted {
                    task_id,
                    duration_ms,
                    ..
                } => {
                    tracing::info!("Task {} completed ({}ms)", task_id, duration_ms);
                }
                TaskEvent::TaskFailed {
                    task_id,
                    stage,
                    error,
                    ..
                } => {
                    tracing::error!("Task {} failed during {}: {}", task_id, stage, error);
                }
            }
        }
    });

    dispatch(args.command, ctx).await
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 0: success
    // 2: bad input or unsupported version
    // 11: config error
    // 20: command / IO error
    // 30: external tool failure
    // 44: unknown task
    // 50: internal/uncategorized
    // 124: stage deadline exceeded
    match e {
        CliError::Config(_) => 11,
        CliError::Pipeline(pe) => match pe.kind() {
            ErrorKind::InputMissing | ErrorKind::InputInvalid | ErrorKind::UnsupportedVersion => 2,
            ErrorKind::Timeout => 124,
            ErrorKind::ResourceError => 20,
            ErrorKind::ToolNotInstalled
            | ErrorKind::InvocationFailed
            | ErrorKind::OutputMissing => 30,
        },
        CliError::NotFound(_) => 44,
        CliError::Io(_) => 20,
        CliError::Command(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

async fn dispatch(cmd: cli::Commands, ctx: AppContext) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Serve(serve_args) => http::handle_serve(serve_args, &ctx).await,
        cli::Commands::Generate(gen_args) => app::run_generate(gen_args, &ctx).await,
        cli::Commands::Check(check_args) => app::run_check(check_args, &ctx),
        cli::Commands::Locate(locate_args) => app::run_locate(locate_args, &ctx),
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("talkhead"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("talkhead.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
