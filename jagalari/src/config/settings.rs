//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;
use std::time::Duration;

use crate::location::GeoFix;
use crate::map::{Coordinate, DefaultViewport};
use crate::telemetry::TraccarConfig;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub telemetry: TelemetrySettings,
    pub map: MapSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
    /// Fixed operator position for headless runs
    pub location: LocationSettings,
}

/// Traccar server connection.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySettings {
    pub url: String,
    pub email: String,
    pub password: String,
    /// Request timeout in seconds
    pub timeout: u64,
}

/// Initial map view.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub default_zoom: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// JSON file holding persisted session state
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationSettings {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Reported accuracy in metres
    pub accuracy: f64,
}

impl ConfigFile {
    pub fn traccar_config(&self) -> TraccarConfig {
        TraccarConfig {
            base_url: self.telemetry.url.clone(),
            email: self.telemetry.email.clone(),
            password: self.telemetry.password.clone(),
            timeout: Duration::from_secs(self.telemetry.timeout),
        }
    }

    pub fn default_viewport(&self) -> DefaultViewport {
        DefaultViewport {
            center: Coordinate::new(self.map.default_latitude, self.map.default_longitude),
            zoom: self.map.default_zoom,
        }
    }

    /// Configured operator position, if both coordinates are set.
    pub fn static_fix(&self) -> Option<GeoFix> {
        match (self.location.latitude, self.location.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoFix {
                coordinate: Coordinate::new(latitude, longitude),
                accuracy_m: self.location.accuracy,
            }),
            _ => None,
        }
    }
}
