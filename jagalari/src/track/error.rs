//! Error types for track overlays.

use std::path::PathBuf;

use thiserror::Error;

use crate::map::SurfaceError;

/// Errors that can occur while loading or rendering a track document.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The document failed structural validation and was never parsed.
    #[error("Malformed track document: {0}")]
    Malformed(String),

    /// The uploaded file is not a `.gpx` file.
    #[error("Not a GPX file: {0}")]
    NotGpxFile(String),

    /// The document looked like GPX but could not be parsed.
    #[error("Failed to parse GPX: {0}")]
    Parse(String),

    /// The document parsed but holds no usable points.
    #[error("Track contains no points")]
    EmptyGeometry,

    /// The map surface refused the overlay.
    #[error("Failed to render track: {0}")]
    Render(#[from] SurfaceError),

    /// Reading the file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrackError {
    /// Whether this failure counts toward the overlay's circuit breaker.
    ///
    /// Documents rejected before parsing do not count; parse, render and
    /// load failures do.
    pub fn counts_toward_breaker(&self) -> bool {
        !matches!(self, TrackError::Malformed(_) | TrackError::NotGpxFile(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_do_not_count() {
        assert!(!TrackError::Malformed("short".into()).counts_toward_breaker());
        assert!(!TrackError::NotGpxFile("a.kml".into()).counts_toward_breaker());
    }

    #[test]
    fn test_parse_and_render_errors_count() {
        assert!(TrackError::Parse("bad".into()).counts_toward_breaker());
        assert!(TrackError::EmptyGeometry.counts_toward_breaker());
        assert!(
            TrackError::Render(SurfaceError::RenderFailed("x".into())).counts_toward_breaker()
        );
    }
}
