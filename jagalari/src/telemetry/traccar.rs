//! Traccar REST client.
//!
//! Fetches `/api/devices` and `/api/positions` with HTTP basic auth using a
//! reusable `reqwest::Client`.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::error::TelemetryError;
use super::source::SnapshotSource;
use crate::fleet::{Device, Position};

/// Default request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for a Traccar server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraccarConfig {
    pub base_url: String,
    pub email: String,
    pub password: String,
    pub timeout: Duration,
}

pub struct TraccarClient {
    http: reqwest::Client,
    base_url: String,
    email: String,
    password: String,
}

impl TraccarClient {
    pub fn new(config: TraccarConfig) -> Result<Self, TelemetryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            email: config.email,
            password: config.password,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, TelemetryError> {
        let url = self.endpoint(path);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.email, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;

        check_status(response.status())?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TelemetryError::Transport(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| TelemetryError::Decode(e.to_string()))
    }
}

/// Map an HTTP status to a telemetry error.
fn check_status(status: StatusCode) -> Result<(), TelemetryError> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TelemetryError::Authentication {
            status: status.as_u16(),
        }),
        s if s.is_success() => Ok(()),
        s => Err(TelemetryError::Transport(format!("HTTP {s}"))),
    }
}

impl SnapshotSource for TraccarClient {
    async fn list_devices(&self) -> Result<Vec<Device>, TelemetryError> {
        let devices: Vec<Device> = self.get_json("devices").await?;
        tracing::debug!(devices = devices.len(), "Traccar devices fetched");
        Ok(devices)
    }

    async fn list_latest_positions(&self) -> Result<Vec<Position>, TelemetryError> {
        let positions: Vec<Position> = self.get_json("positions").await?;
        tracing::debug!(positions = positions.len(), "Traccar positions fetched");
        Ok(positions)
    }
}
