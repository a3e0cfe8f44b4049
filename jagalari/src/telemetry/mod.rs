//! Telemetry Snapshot Source - devices and latest positions from the
//! tracking backend, polled on a fixed interval.

mod error;
mod poller;
mod source;
mod traccar;

pub use error::TelemetryError;
pub use poller::{SnapshotPoller, POLL_INTERVAL};
pub use source::{fetch_snapshot, SnapshotSource};
pub use traccar::{TraccarClient, TraccarConfig, DEFAULT_HTTP_TIMEOUT};

#[cfg(test)]
pub(crate) use source::mock;
