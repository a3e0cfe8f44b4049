//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::defaults::MAX_MAP_ZOOM;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [telemetry] section
    if let Some(section) = ini.section(Some("telemetry")) {
        if let Some(v) = non_empty(section, "url") {
            if !(v.starts_with("http://") || v.starts_with("https://")) {
                return Err(invalid(
                    "telemetry",
                    "url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.telemetry.url = v.to_string();
        }
        if let Some(v) = non_empty(section, "email") {
            config.telemetry.email = v.to_string();
        }
        if let Some(v) = section.get("password") {
            config.telemetry.password = v.to_string();
        }
        if let Some(v) = non_empty(section, "timeout") {
            let timeout: u64 = parse_value("telemetry", "timeout", v, "must be a positive integer (seconds)")?;
            if timeout == 0 {
                return Err(invalid(
                    "telemetry",
                    "timeout",
                    v,
                    "must be a positive integer (seconds)",
                ));
            }
            config.telemetry.timeout = timeout;
        }
    }

    // [map] section
    if let Some(section) = ini.section(Some("map")) {
        if let Some(v) = non_empty(section, "default_latitude") {
            config.map.default_latitude = parse_latitude("map", "default_latitude", v)?;
        }
        if let Some(v) = non_empty(section, "default_longitude") {
            config.map.default_longitude = parse_longitude("map", "default_longitude", v)?;
        }
        if let Some(v) = non_empty(section, "default_zoom") {
            let reason = "must be an integer between 0 and 19";
            let zoom: u8 = parse_value("map", "default_zoom", v, reason)?;
            if zoom > MAX_MAP_ZOOM {
                return Err(invalid("map", "default_zoom", v, reason));
            }
            config.map.default_zoom = zoom;
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = non_empty(section, "path") {
            config.storage.path = expand_tilde(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = non_empty(section, "latitude") {
            config.location.latitude = Some(parse_latitude("location", "latitude", v)?);
        }
        if let Some(v) = non_empty(section, "longitude") {
            config.location.longitude = Some(parse_longitude("location", "longitude", v)?);
        }
        if let Some(v) = non_empty(section, "accuracy") {
            let reason = "must be a non-negative number (metres)";
            let accuracy: f64 = parse_value("location", "accuracy", v, reason)?;
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(invalid("location", "accuracy", v, reason));
            }
            config.location.accuracy = accuracy;
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value.parse().map_err(|_| invalid(section, key, value, reason))
}

fn parse_latitude(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let reason = "must be a number between -90 and 90";
    let lat: f64 = parse_value(section, key, value, reason)?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(invalid(section, key, value, reason));
    }
    Ok(lat)
}

fn parse_longitude(section: &str, key: &str, value: &str) -> Result<f64, ConfigFileError> {
    let reason = "must be a number between -180 and 180";
    let lon: f64 = parse_value(section, key, value, reason)?;
    if !(-180.0..=180.0).contains(&lon) {
        return Err(invalid(section, key, value, reason));
    }
    Ok(lon)
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(text).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_telemetry_section() {
        let config = parse(
            "[telemetry]\nurl = https://track.example.com\nemail = ops@example.com\npassword = s3cret\ntimeout = 20\n",
        )
        .unwrap();

        assert_eq!(config.telemetry.url, "https://track.example.com");
        assert_eq!(config.telemetry.email, "ops@example.com");
        assert_eq!(config.telemetry.password, "s3cret");
        assert_eq!(config.telemetry.timeout, 20);
        assert_eq!(config.traccar_config().timeout.as_secs(), 20);
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = parse("[telemetry]\nurl =\ntimeout =\n").unwrap();
        assert_eq!(config.telemetry.url, DEFAULT_TELEMETRY_URL);
        assert_eq!(config.telemetry.timeout, DEFAULT_TELEMETRY_TIMEOUT_SECS);
    }

    #[test]
    fn test_invalid_url_names_key() {
        let err = parse("[telemetry]\nurl = ftp://nope\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "telemetry");
                assert_eq!(key, "url");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(parse("[telemetry]\ntimeout = 0\n").is_err());
        assert!(parse("[telemetry]\ntimeout = soon\n").is_err());
    }

    #[test]
    fn test_map_section() {
        let config =
            parse("[map]\ndefault_latitude = -7.25\ndefault_longitude = 112.75\ndefault_zoom = 11\n")
                .unwrap();

        let viewport = config.default_viewport();
        assert_eq!(viewport.center.latitude, -7.25);
        assert_eq!(viewport.center.longitude, 112.75);
        assert_eq!(viewport.zoom, 11);
    }

    #[test]
    fn test_map_ranges_enforced() {
        assert!(parse("[map]\ndefault_latitude = 91\n").is_err());
        assert!(parse("[map]\ndefault_longitude = -181\n").is_err());
        assert!(parse("[map]\ndefault_zoom = 25\n").is_err());
    }

    #[test]
    fn test_location_section() {
        let config = parse("[location]\nlatitude = -6.3\nlongitude = 106.7\naccuracy = 5\n").unwrap();

        let fix = config.static_fix().unwrap();
        assert_eq!(fix.coordinate.latitude, -6.3);
        assert_eq!(fix.accuracy_m, 5.0);
    }

    #[test]
    fn test_location_needs_both_coordinates() {
        let config = parse("[location]\nlatitude = -6.3\n").unwrap();
        assert!(config.static_fix().is_none());
    }

    #[test]
    fn test_paths_expand_tilde() {
        let config = parse("[storage]\npath = /var/lib/jagalari/state.json\n[logging]\nfile = ~/logs/j.log\n").unwrap();

        assert_eq!(config.storage.path, PathBuf::from("/var/lib/jagalari/state.json"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.logging.file, home.join("logs/j.log"));
        }
    }
}
