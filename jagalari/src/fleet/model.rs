//! Fleet data model as delivered by the telemetry service.
//!
//! Field names follow the Traccar REST API (`camelCase` on the wire).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classifier::{classify, is_online, Category};
use crate::map::Coordinate;

/// Device identifier assigned by the telemetry service.
pub type DeviceId = i64;

/// A tracked vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub unique_id: String,
    /// Raw status string (`online`, `offline`, `unknown`, ...).
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position_id: Option<i64>,
}

impl Device {
    pub fn category(&self) -> Category {
        classify(&self.name)
    }

    pub fn is_online(&self) -> bool {
        is_online(&self.status)
    }
}

/// A position fix reported for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: i64,
    pub device_id: DeviceId,
    pub latitude: f64,
    pub longitude: f64,
    /// Speed in knots.
    #[serde(default)]
    pub speed: f64,
    /// Course over ground in degrees.
    #[serde(default)]
    pub course: f64,
    /// Altitude in meters.
    #[serde(default)]
    pub altitude: f64,
    /// Horizontal accuracy in meters (0 when unknown).
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default, alias = "timestamp")]
    pub fix_time: Option<DateTime<Utc>>,
}

impl Position {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A device paired with its latest position.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedFix<'a> {
    pub device: &'a Device,
    pub position: &'a Position,
}

/// Result of one poll: devices and their latest positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    pub positions: Vec<Position>,
    pub received_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(devices: Vec<Device>, positions: Vec<Position>) -> Self {
        Self {
            devices,
            positions,
            received_at: Some(Utc::now()),
        }
    }

    /// Pair each position with its device.
    ///
    /// Positions whose device is absent from this snapshot are dropped; the
    /// two endpoints are polled independently so this is expected, not an
    /// error. When a device has several positions, the one with the latest
    /// fix time wins (a later entry wins a tie). Output follows the order in
    /// which each device's winning position first appeared.
    pub fn resolve(&self) -> Vec<ResolvedFix<'_>> {
        let devices: HashMap<DeviceId, &Device> =
            self.devices.iter().map(|d| (d.id, d)).collect();

        let mut order: Vec<DeviceId> = Vec::new();
        let mut latest: HashMap<DeviceId, &Position> = HashMap::new();

        for position in &self.positions {
            if !devices.contains_key(&position.device_id) {
                continue;
            }
            match latest.get(&position.device_id) {
                Some(current) if current.fix_time > position.fix_time => {}
                Some(_) => {
                    latest.insert(position.device_id, position);
                }
                None => {
                    order.push(position.device_id);
                    latest.insert(position.device_id, position);
                }
            }
        }

        order
            .into_iter()
            .filter_map(|id| {
                Some(ResolvedFix {
                    device: devices.get(&id)?,
                    position: latest.get(&id)?,
                })
            })
            .collect()
    }

    /// Number of positions that reference no device in this snapshot.
    pub fn dangling_positions(&self) -> usize {
        self.positions
            .iter()
            .filter(|p| !self.devices.iter().any(|d| d.id == p.device_id))
            .count()
    }
}
