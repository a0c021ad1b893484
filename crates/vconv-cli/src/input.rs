//! Builds an upload selection from a path on disk.

use std::path::Path;

use anyhow::{Context, Result};
use vconv_models::{validate, FileMeta, UploadSelection};

/// Selection for `path`. A path that does not exist is treated like an
/// empty file picker.
pub fn selection_from_path(
    path: &Path,
    target_format: &str,
    preset: Option<&str>,
) -> Result<UploadSelection> {
    if !path.exists() {
        return Ok(UploadSelection::empty(target_format));
    }

    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata of {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("{} has no file name", path.display()))?;

    let mut selection = UploadSelection::single(FileMeta::new(name, metadata.len()), target_format);
    if let Some(preset) = preset {
        selection = selection.with_preset(preset);
    }
    Ok(selection)
}

/// File content to upload; empty when the selection will not pass
/// validation, so oversized files are never read.
pub async fn upload_bytes(path: &Path, selection: &UploadSelection) -> Result<Vec<u8>> {
    if validate(selection).is_err() {
        return Ok(Vec::new());
    }

    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}
