//! Locating, validating and moving stage artifacts.

use std::path::{Path, PathBuf};

use glob::Pattern;

use crate::error::StageError;

use super::types::{ResolutionMethod, StageResult};

/// Name the animation engine is expected to give its output.
pub const CANONICAL_RESULT: &str = "result.mp4";

/// Finds the animation artifact inside `result_dir` and moves it to `output`.
///
/// The canonical `result.mp4` wins; otherwise the first `*.mp4` anywhere below
/// `result_dir` in lexicographic order of its relative path is taken.
pub async fn resolve_video_output(
    result_dir: &Path,
    output: &Path,
) -> Result<StageResult, StageError> {
    let canonical = result_dir.join(CANONICAL_RESULT);
    if is_file(&canonical).await {
        move_file(&canonical, output).await?;
        return Ok(StageResult::expected(output));
    }

    let candidates = scan(result_dir, "**/*.mp4")
        .into_iter()
        .filter(|(_, p)| p.is_file())
        .collect::<Vec<_>>();

    match candidates.first() {
        Some((rel, found)) => {
            tracing::info!(
                result_dir = %result_dir.display(),
                picked = %rel,
                candidates = candidates.len(),
                "canonical result missing, using fallback scan"
            );
            move_file(found, output).await?;
            Ok(StageResult {
                output_path: output.to_path_buf(),
                resolution_method: ResolutionMethod::FallbackScan,
            })
        }
        None => Err(StageError::OutputMissing {
            expected: canonical,
            listing: list_tree(result_dir),
        }),
    }
}

/// Checks that a stage left a non-empty regular file at `path`.
pub async fn require_artifact(path: &Path) -> Result<(), StageError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(StageError::OutputMissing {
            expected: path.to_path_buf(),
            listing: path.parent().map(list_tree).unwrap_or_default(),
        }),
    }
}

/// Sorted relative listing of everything under `dir`; directories end in `/`.
pub fn list_tree(dir: &Path) -> Vec<String> {
    scan(dir, "**/*")
        .into_iter()
        .map(|(rel, p)| if p.is_dir() { format!("{rel}/") } else { rel })
        .collect()
}

/// Renames `from` onto `to`, falling back to copy and remove across devices.
pub async fn move_file(from: &Path, to: &Path) -> Result<(), StageError> {
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| StageError::resource(to, e))?;
    if let Err(e) = tokio::fs::remove_file(from).await {
        tracing::warn!(path = %from.display(), error = %e, "failed to remove moved file");
    }
    Ok(())
}

/// Removes a scratch directory; a directory that is already gone is fine.
pub async fn discard_dir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %dir.display(), error = %e, "failed to discard scratch directory"),
    }
}

/// Removes a scratch file; a file that was never written is fine.
pub async fn discard_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to discard scratch file"),
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Glob below `dir`, returning `(relative_path, absolute_path)` sorted by the
/// relative path so results never depend on directory enumeration order.
fn scan(dir: &Path, pattern: &str) -> Vec<(String, PathBuf)> {
    let full = format!(
        "{}/{}",
        Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let paths = match glob::glob(&full) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!(pattern = %full, error = %e, "invalid scan pattern");
            return Vec::new();
        }
    };

    let mut hits: Vec<(String, PathBuf)> = paths
        .filter_map(Result::ok)
        .filter_map(|p| {
            let rel = p.strip_prefix(dir).ok()?.to_string_lossy().replace('\\', "/");
            Some((rel, p))
        })
        .collect();
    hits.sort_by(|a, b| a.0.cmp(&b.0));
    hits
}
