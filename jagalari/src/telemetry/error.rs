//! Error types for the telemetry source.

use thiserror::Error;

/// Errors that can occur when fetching a snapshot.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelemetryError {
    /// The server rejected the configured credentials.
    #[error("Authentication failed (HTTP {status})")]
    Authentication { status: u16 },

    /// The request failed or the server returned an error status.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl TelemetryError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, TelemetryError::Authentication { .. })
    }
}
