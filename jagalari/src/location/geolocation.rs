//! Platform geolocation service abstraction.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::map::Coordinate;

/// Options for a single position request.
#[derive(Debug, Clone, PartialEq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the platform may return.
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// A position reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub coordinate: Coordinate,
    pub accuracy_m: f64,
}

/// Classified platform geolocation failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location information is unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Unknown location error: {0}")]
    Unknown(String),
}

impl GeolocationError {
    /// Classify a platform error code.
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            1 => GeolocationError::PermissionDenied,
            2 => GeolocationError::PositionUnavailable,
            3 => GeolocationError::Timeout,
            _ => GeolocationError::Unknown(message.into()),
        }
    }

    /// Platform code of this error; 0 for unknown.
    pub fn code(&self) -> u16 {
        match self {
            GeolocationError::PermissionDenied => 1,
            GeolocationError::PositionUnavailable => 2,
            GeolocationError::Timeout => 3,
            GeolocationError::Unknown(_) => 0,
        }
    }
}

/// Single-shot position source.
pub trait GeolocationService: Send + Sync + 'static {
    fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> impl Future<Output = Result<GeoFix, GeolocationError>> + Send;
}

/// Geolocation that always answers with a configured fix.
///
/// Used for headless runs where the operator's position comes from
/// configuration rather than a device sensor.
#[derive(Debug, Clone)]
pub struct StaticGeolocation {
    fix: Option<GeoFix>,
}

impl StaticGeolocation {
    pub fn new(fix: Option<GeoFix>) -> Self {
        Self { fix }
    }

    pub fn at(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self::new(Some(GeoFix {
            coordinate: Coordinate::new(latitude, longitude),
            accuracy_m,
        }))
    }
}

impl GeolocationService for StaticGeolocation {
    async fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> Result<GeoFix, GeolocationError> {
        self.fix.ok_or(GeolocationError::PositionUnavailable)
    }
}
