//! Events delivered to the session's event loop.

use std::path::PathBuf;

use crate::fleet::Snapshot;
use crate::location::{GeoFix, GeolocationError};
use crate::telemetry::TelemetryError;
use crate::track::{TrackError, TrackUpload};

/// Everything that can change session state.
///
/// Background tasks report results with the first three variants; the rest
/// are operator commands.
#[derive(Debug)]
pub enum SessionEvent {
    /// A poll finished.
    Poll(Result<Snapshot, TelemetryError>),
    /// A location request finished.
    Location(Result<GeoFix, GeolocationError>),
    /// A track file finished loading.
    TrackLoaded(Result<TrackUpload, TrackError>),

    SetTrails(bool),
    RequestLocation,
    LoadTrack(PathBuf),
    ClearTrack,
    FitToTrack,
    ResetTrackFailures,
}
