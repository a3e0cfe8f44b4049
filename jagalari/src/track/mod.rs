//! Track Overlay Manager - a single uploaded GPX route drawn on the map.
//!
//! The document is validated structurally, parsed with the `gpx` crate and
//! drawn as one polyline overlay. Repeated parse or render failures open a
//! circuit breaker that stops further rendering until reset.

mod document;
mod error;
mod loader;
mod manager;

pub use document::{parse, validate, TrackGeometry, MIN_DOCUMENT_LEN, ROOT_MARKER};
pub use error::TrackError;
pub use loader::{is_track_file, read_track_file, TrackUpload, TRACK_EXTENSION};
pub use manager::{
    DocumentOutcome, TrackFit, TrackOverlayManager, TrackStatus, FAILURE_THRESHOLD, TRACK_COLOR,
    TRACK_FALLBACK_ZOOM,
};

#[cfg(test)]
pub(crate) use document::samples;
