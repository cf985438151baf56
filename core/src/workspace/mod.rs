//! Per-task workspace directories.
//!
//! Every task owns `<output_root>/<task_id>/` exclusively. Artifacts inside it
//! use fixed names so any tool can find them from the task id alone:
//!
//! ```text
//! <output_root>/<task_id>/
//!   input.jpg  input.txt  tts.wav  animation_output.mp4  final.mp4
//! ```

mod id;

use std::path::{Path, PathBuf};

use crate::error::StageError;

pub use id::{generate_task_id, is_valid_task_id};

pub const INPUT_IMAGE: &str = "input.jpg";
pub const INPUT_TEXT: &str = "input.txt";
pub const TTS_AUDIO: &str = "tts.wav";
pub const ANIMATION_VIDEO: &str = "animation_output.mp4";
pub const FINAL_VIDEO: &str = "final.mp4";
/// Scratch directory the animation engine writes into; removed once resolved.
pub const ANIMATION_RESULT_DIR: &str = ".animation_result";

const MAX_CREATE_ATTEMPTS: usize = 3;

/// A task's directory. Handed to every stage by parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    task_id: String,
    path: PathBuf,
}

impl Workspace {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    pub fn input_image(&self) -> PathBuf {
        self.file(INPUT_IMAGE)
    }

    pub fn input_text(&self) -> PathBuf {
        self.file(INPUT_TEXT)
    }

    pub fn tts_audio(&self) -> PathBuf {
        self.file(TTS_AUDIO)
    }

    pub fn animation_video(&self) -> PathBuf {
        self.file(ANIMATION_VIDEO)
    }

    pub fn final_video(&self) -> PathBuf {
        self.file(FINAL_VIDEO)
    }

    pub fn animation_result_dir(&self) -> PathBuf {
        self.file(ANIMATION_RESULT_DIR)
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    output_root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Allocates a fresh, empty directory for a new task.
    ///
    /// The leaf is created with `create_dir` (not `create_dir_all`) so an
    /// existing directory is never handed out twice.
    pub async fn create_workspace(&self) -> Result<Workspace, StageError> {
        tokio::fs::create_dir_all(&self.output_root)
            .await
            .map_err(|e| StageError::resource(&self.output_root, e))?;

        let mut last_err = None;
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let task_id = generate_task_id();
            let path = self.output_root.join(&task_id);
            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    tracing::debug!(task_id = %task_id, path = %path.display(), "workspace created");
                    return Ok(Workspace { task_id, path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tracing::warn!(task_id = %task_id, "workspace id collision, regenerating");
                    last_err = Some(StageError::resource(path, e));
                }
                Err(e) => return Err(StageError::resource(path, e)),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            StageError::resource(
                &self.output_root,
                std::io::Error::other("workspace allocation exhausted"),
            )
        }))
    }

    /// Final artifact of a finished task, if present. No side effects.
    pub fn locate_final(&self, task_id: &str) -> Option<PathBuf> {
        if !is_valid_task_id(task_id) {
            return None;
        }
        let path = self.output_root.join(task_id).join(FINAL_VIDEO);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }
}
