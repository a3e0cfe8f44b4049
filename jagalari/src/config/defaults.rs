//! Default values and constants for all configuration settings.

use super::file::config_directory;
use super::settings::*;

/// Public Traccar demo server.
pub const DEFAULT_TELEMETRY_URL: &str = "https://demo.traccar.org";

pub const DEFAULT_TELEMETRY_EMAIL: &str = "admin";

pub const DEFAULT_TELEMETRY_PASSWORD: &str = "admin";

/// Default request timeout in seconds.
pub const DEFAULT_TELEMETRY_TIMEOUT_SECS: u64 = 10;

/// Central Jakarta.
pub const DEFAULT_MAP_LATITUDE: f64 = -6.2088;

pub const DEFAULT_MAP_LONGITUDE: f64 = 106.8456;

pub const DEFAULT_MAP_ZOOM: u8 = 13;

/// Highest zoom level accepted in `[map] default_zoom`.
pub const MAX_MAP_ZOOM: u8 = 19;

/// Default accuracy reported for a configured location, in metres.
pub const DEFAULT_LOCATION_ACCURACY_M: f64 = 10.0;

pub const DEFAULT_STORAGE_FILE: &str = "state.json";

pub const DEFAULT_LOG_FILE: &str = "jagalari.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            telemetry: TelemetrySettings {
                url: DEFAULT_TELEMETRY_URL.to_string(),
                email: DEFAULT_TELEMETRY_EMAIL.to_string(),
                password: DEFAULT_TELEMETRY_PASSWORD.to_string(),
                timeout: DEFAULT_TELEMETRY_TIMEOUT_SECS,
            },
            map: MapSettings {
                default_latitude: DEFAULT_MAP_LATITUDE,
                default_longitude: DEFAULT_MAP_LONGITUDE,
                default_zoom: DEFAULT_MAP_ZOOM,
            },
            storage: StorageSettings {
                path: config_dir.join(DEFAULT_STORAGE_FILE),
            },
            logging: LoggingSettings {
                file: config_dir.join("logs").join(DEFAULT_LOG_FILE),
            },
            location: LocationSettings {
                latitude: None,
                longitude: None,
                accuracy: DEFAULT_LOCATION_ACCURACY_M,
            },
        }
    }
}
