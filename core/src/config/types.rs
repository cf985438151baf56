use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::version::{InferenceOverrides, InferenceParams};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub animation: AnimationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root under which every task gets its own `<task_id>/` directory.
    #[serde(default = "default_output_root")]
    pub output_root: String,
}

fn default_output_root() -> String {
    "output".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "talkhead_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,

    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Whole-request timeout; generation requests block until the pipeline finishes.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_max_upload_mb() -> usize {
    20
}

fn default_request_timeout_secs() -> u64 {
    1_800
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
            max_upload_mb: default_max_upload_mb(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Per-stage deadlines. `0` disables the deadline for that stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_synthesis_timeout_secs")]
    pub synthesis_timeout_secs: u64,

    #[serde(default = "default_animation_timeout_secs")]
    pub animation_timeout_secs: u64,

    #[serde(default = "default_merge_timeout_secs")]
    pub merge_timeout_secs: u64,

    /// Bytes of stdout/stderr tail kept per child process for diagnostics.
    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,

    /// Finished tasks kept in the in-memory registry; older ones are evicted.
    #[serde(default = "default_keep_finished_tasks")]
    pub keep_finished_tasks: usize,
}

fn default_synthesis_timeout_secs() -> u64 {
    600
}

fn default_animation_timeout_secs() -> u64 {
    1_200
}

fn default_merge_timeout_secs() -> u64 {
    300
}

fn default_capture_bytes() -> usize {
    16 * 1024
}

fn default_keep_finished_tasks() -> usize {
    1_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            synthesis_timeout_secs: default_synthesis_timeout_secs(),
            animation_timeout_secs: default_animation_timeout_secs(),
            merge_timeout_secs: default_merge_timeout_secs(),
            capture_bytes: default_capture_bytes(),
            keep_finished_tasks: default_keep_finished_tasks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub tts: TtsToolConfig,

    #[serde(default)]
    pub mux: MuxToolConfig,
}

/// External speech synthesizer. `args` may reference `{text_file}` and `{output}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsToolConfig {
    #[serde(default = "default_tts_program")]
    pub program: String,

    /// Optional script passed as the first argument (made absolute at load time).
    #[serde(default = "default_tts_script")]
    pub script: Option<String>,

    #[serde(default = "default_tts_args")]
    pub args: Vec<String>,
}

fn default_tts_program() -> String {
    "python".to_string()
}

fn default_tts_script() -> Option<String> {
    Some("scripts/generate_audio.py".to_string())
}

fn default_tts_args() -> Vec<String> {
    ["--text", "{text_file}", "--output", "{output}"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for TtsToolConfig {
    fn default() -> Self {
        Self {
            program: default_tts_program(),
            script: default_tts_script(),
            args: default_tts_args(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuxToolConfig {
    #[serde(default = "default_mux_program")]
    pub program: String,

    /// Codec the audio track is re-encoded to.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,
}

fn default_mux_program() -> String {
    "ffmpeg".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

impl Default for MuxToolConfig {
    fn default() -> Self {
        Self {
            program: default_mux_program(),
            audio_codec: default_audio_codec(),
        }
    }
}

/// Lip-sync engine checkout and its supported model versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_engine_dir")]
    pub engine_dir: String,

    #[serde(default = "default_python")]
    pub python: String,

    /// Entry script, relative to `engine_dir`.
    #[serde(default = "default_entry_script")]
    pub entry_script: String,

    #[serde(default = "default_cpu_only")]
    pub cpu_only: bool,

    #[serde(default = "default_version")]
    pub default_version: String,

    #[serde(default)]
    pub inference: InferenceParams,

    #[serde(default = "default_versions")]
    pub versions: BTreeMap<String, VersionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Relative to `engine_dir`.
    pub model_dir: String,
    pub model_file: String,
    pub config_file: String,
    /// Value passed to the engine's `--version` flag.
    pub version_arg: String,
    /// Per-version inference defaults, layered over `[animation.inference]`.
    #[serde(default)]
    pub inference: InferenceOverrides,
}

fn default_engine_dir() -> String {
    "external/MuseTalk".to_string()
}

fn default_python() -> String {
    "python".to_string()
}

fn default_entry_script() -> String {
    "app.py".to_string()
}

fn default_cpu_only() -> bool {
    true
}

fn default_version() -> String {
    "v1.5".to_string()
}

fn default_versions() -> BTreeMap<String, VersionEntry> {
    let mut versions = BTreeMap::new();
    versions.insert(
        "v1.0".to_string(),
        VersionEntry {
            model_dir: "models/musetalk".to_string(),
            model_file: "pytorch_model.bin".to_string(),
            config_file: "musetalk.json".to_string(),
            version_arg: "v1".to_string(),
            inference: InferenceOverrides::default(),
        },
    );
    versions.insert(
        "v1.5".to_string(),
        VersionEntry {
            model_dir: "models/musetalkV15".to_string(),
            model_file: "unet.pth".to_string(),
            config_file: "musetalk.json".to_string(),
            version_arg: "v15".to_string(),
            inference: InferenceOverrides::default(),
        },
    );
    versions
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            engine_dir: default_engine_dir(),
            python: default_python(),
            entry_script: default_entry_script(),
            cpu_only: default_cpu_only(),
            default_version: default_version(),
            inference: InferenceParams::default(),
            versions: default_versions(),
        }
    }
}
