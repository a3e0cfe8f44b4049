//! Reading track files from disk.

use std::path::{Path, PathBuf};

use super::error::TrackError;

/// Extension accepted for uploads, compared case-insensitively.
pub const TRACK_EXTENSION: &str = "gpx";

/// A track file read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackUpload {
    pub file_name: String,
    pub content: String,
}

/// Whether `path` names a `.gpx` file.
pub fn is_track_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TRACK_EXTENSION))
}

/// Read a `.gpx` file.
///
/// Files with any other extension are rejected before touching the disk.
pub async fn read_track_file(path: impl Into<PathBuf>) -> Result<TrackUpload, TrackError> {
    let path = path.into();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !is_track_file(&path) {
        return Err(TrackError::NotGpxFile(file_name));
    }

    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| TrackError::Io {
            path: path.clone(),
            source,
        })?;

    tracing::debug!(file = %file_name, bytes = content.len(), "Read track file");

    Ok(TrackUpload { file_name, content })
}
