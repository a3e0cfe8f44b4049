//! Self-location state and its persisted form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geolocation::GeolocationError;
use crate::map::Coordinate;

/// Live self-location state.
///
/// Whether a request is outstanding is tracked by
/// [`SelfLocationManager::is_in_flight`](super::SelfLocationManager::is_in_flight).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelfLocationState {
    pub coordinate: Option<Coordinate>,
    pub accuracy_m: Option<f64>,
    pub captured_at: Option<DateTime<Utc>>,
    pub last_error: Option<GeolocationError>,
}

impl SelfLocationState {
    /// Human-readable description of the last failure.
    pub fn last_error_message(&self) -> Option<String> {
        self.last_error.as_ref().map(ToString::to_string)
    }
}

/// Record written to client storage after every successful fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLocation {
    pub lat: f64,
    pub lng: f64,
    pub zoom_hint: u8,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub accuracy_meters: Option<f64>,
}

impl PersistedLocation {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_location_wire_format() {
        let json = r#"{"lat":-6.2,"lng":106.8,"zoomHint":16,"capturedAt":"2024-05-01T08:00:00Z","accuracyMeters":25.0}"#;

        let record: PersistedLocation = serde_json::from_str(json).unwrap();

        assert_eq!(record.coordinate(), Coordinate::new(-6.2, 106.8));
        assert_eq!(record.zoom_hint, 16);
        assert_eq!(record.accuracy_meters, Some(25.0));
    }

    #[test]
    fn test_accuracy_is_optional() {
        let json = r#"{"lat":1.0,"lng":2.0,"zoomHint":16,"capturedAt":"2024-05-01T08:00:00Z"}"#;
        let record: PersistedLocation = serde_json::from_str(json).unwrap();
        assert!(record.accuracy_meters.is_none());
    }
}
