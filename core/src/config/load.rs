use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default talkhead data directory: ~/.talkhead
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".talkhead"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.talkhead/config.toml (highest)
    let data_dir = get_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    finalize(cfg, &data_dir, &std::env::current_dir()?)
}

/// Loads an explicitly named config file with the same post-processing as
/// [`load_default`].
pub fn load_explicit(path: &Path) -> anyhow::Result<AppConfig> {
    let cfg = load_from_path(path)?;
    finalize(cfg, &get_data_dir()?, &std::env::current_dir()?)
}

/// Default log directory, environment overrides (Priority 0: highest), then
/// absolute paths anchored at `cwd`.
fn finalize(mut cfg: AppConfig, data_dir: &Path, cwd: &Path) -> anyhow::Result<AppConfig> {
    if cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg);
    cfg.absolutize(cwd);

    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Some(v) = non_empty_env("TALKHEAD_OUTPUT_ROOT") {
        cfg.workspace.output_root = v;
    }
    if let Some(v) = non_empty_env("TALKHEAD_ANIMATION_VERSION") {
        cfg.animation.default_version = v;
    }
    if let Some(v) = non_empty_env("TALKHEAD_MUSETALK_DIR") {
        cfg.animation.engine_dir = v;
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Anchors every relative directory at `base` so child processes only ever
    /// receive absolute paths.
    pub fn absolutize(&mut self, base: &Path) {
        self.workspace.output_root = anchor(base, &self.workspace.output_root);
        self.animation.engine_dir = anchor(base, &self.animation.engine_dir);
        if let Some(script) = self.tools.tts.script.as_mut() {
            *script = anchor(base, script);
        }
    }
}

fn anchor(base: &Path, p: &str) -> String {
    let path = Path::new(p);
    if path.is_absolute() {
        p.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
