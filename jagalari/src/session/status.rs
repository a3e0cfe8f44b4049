//! Read-only view of session state for presentation.

use chrono::{DateTime, Utc};

use crate::fleet::{DeviceSummary, FleetStats};
use crate::map::Coordinate;
use crate::track::TrackStatus;

/// Banner shown while the telemetry backend rejects our credentials.
pub const AUTH_BANNER: &str =
    "Telemetry authentication failed. Check the [telemetry] credentials in config.ini";

#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    /// The last poll was rejected for bad credentials.
    pub auth_error: bool,
    /// The last poll failed for another reason.
    pub last_error: Option<String>,
    /// Time of the last applied snapshot.
    pub last_update: Option<DateTime<Utc>>,
    pub stats: FleetStats,
    pub devices: Vec<DeviceSummary>,
    pub trails_enabled: bool,
    pub track: TrackStatus,
    pub track_file: Option<String>,
    pub location: Option<Coordinate>,
    pub location_error: Option<String>,
}

impl SessionStatus {
    pub fn auth_banner(&self) -> Option<&'static str> {
        self.auth_error.then_some(AUTH_BANNER)
    }
}
