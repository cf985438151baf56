use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Inference parameters handed to the animation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceParams {
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Mouth-region bias: positive opens the mouth wider, negative narrows it.
    #[serde(default)]
    pub bbox_shift: i32,

    #[serde(default = "default_use_float16")]
    pub use_float16: bool,
}

fn default_fps() -> u32 {
    25
}

fn default_use_float16() -> bool {
    true
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            bbox_shift: 0,
            use_float16: default_use_float16(),
        }
    }
}

/// Partial [`InferenceParams`]; every present field wins over the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceOverrides {
    #[serde(default, alias = "frame_rate", skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,

    #[serde(default, alias = "mouth_shift_bias", skip_serializing_if = "Option::is_none")]
    pub bbox_shift: Option<i32>,

    #[serde(default, alias = "use_low_precision", skip_serializing_if = "Option::is_none")]
    pub use_float16: Option<bool>,
}

impl InferenceOverrides {
    pub fn is_empty(&self) -> bool {
        self.fps.is_none() && self.bbox_shift.is_none() && self.use_float16.is_none()
    }

    /// Shallow, field-by-field merge.
    pub fn apply_to(&self, params: InferenceParams) -> InferenceParams {
        InferenceParams {
            fps: self.fps.unwrap_or(params.fps),
            bbox_shift: self.bbox_shift.unwrap_or(params.bbox_shift),
            use_float16: self.use_float16.unwrap_or(params.use_float16),
        }
    }
}

/// Everything the animation adapter needs for one engine version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionConfig {
    /// Key the caller asked for, e.g. `v1.5`.
    pub version_key: String,
    /// Value for the engine's own `--version` flag, e.g. `v15`.
    pub engine_version_tag: String,
    pub engine_dir: PathBuf,
    pub model_directory: PathBuf,
    pub model_file: PathBuf,
    pub config_file: PathBuf,
    pub inference: InferenceParams,
}
