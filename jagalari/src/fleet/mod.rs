//! Fleet data: devices, positions, snapshots and classification.
//!
//! - [`model`] - `Device`, `Position` and `Snapshot` (Traccar wire format)
//! - [`classifier`] - name → `Category`, status → online flag
//! - [`stats`] - `FleetStats` and `DeviceSummary` for the sidebar

mod classifier;
mod model;
mod stats;

pub use classifier::{classify, is_online, Category};
pub use model::{Device, DeviceId, Position, ResolvedFix, Snapshot};
pub use stats::{DeviceSummary, FleetStats};

#[cfg(test)]
pub(crate) use model::fixtures;
