//! Snapshot source abstraction.

use std::future::Future;

use super::error::TelemetryError;
use crate::fleet::{Device, Position, Snapshot};

/// A fleet telemetry backend.
///
/// Both calls fail with [`TelemetryError::Authentication`] on bad credentials
/// and with another variant on any other failure.
pub trait SnapshotSource: Send + Sync + 'static {
    fn list_devices(&self) -> impl Future<Output = Result<Vec<Device>, TelemetryError>> + Send;

    /// Latest known position of every device.
    fn list_latest_positions(
        &self,
    ) -> impl Future<Output = Result<Vec<Position>, TelemetryError>> + Send;
}

/// Fetch devices and positions concurrently and pair them into a snapshot.
///
/// Either call failing fails the whole snapshot; an authentication failure
/// takes precedence over other errors.
pub async fn fetch_snapshot<S: SnapshotSource + ?Sized>(source: &S) -> Result<Snapshot, TelemetryError> {
    let (devices, positions) = tokio::join!(source.list_devices(), source.list_latest_positions());

    match (devices, positions) {
        (Ok(devices), Ok(positions)) => Ok(Snapshot::new(devices, positions)),
        (Err(devices), Err(positions)) => {
            if positions.is_authentication() && !devices.is_authentication() {
                Err(positions)
            } else {
                Err(devices)
            }
        }
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
    }
}
