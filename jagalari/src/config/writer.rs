//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! Produces the commented representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let latitude = config
        .location
        .latitude
        .map(|v| v.to_string())
        .unwrap_or_default();
    let longitude = config
        .location
        .longitude
        .map(|v| v.to_string())
        .unwrap_or_default();

    format!(
        r#"[telemetry]
; Traccar server base URL
url = {}
; Traccar account used for HTTP basic auth
email = {}
password = {}
; Request timeout in seconds
timeout = {}

[map]
; View used before any device or location is known
default_latitude = {}
default_longitude = {}
default_zoom = {}

[storage]
; JSON file holding the last location fix and uploaded track
path = {}

[logging]
; Log file (cleared at the start of each run)
file = {}

[location]
; Fixed operator position used by `jagalari run --here`
; Leave empty when no position should be reported
latitude = {}
longitude = {}
; Accuracy reported with the fixed position, in metres
accuracy = {}
"#,
        config.telemetry.url,
        config.telemetry.email,
        config.telemetry.password,
        config.telemetry.timeout,
        config.map.default_latitude,
        config.map.default_longitude,
        config.map.default_zoom,
        path_to_string(&config.storage.path),
        path_to_string(&config.logging.file),
        latitude,
        longitude,
        config.location.accuracy,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
