//! Fleet summary shown next to the map.

use super::classifier::Category;
use super::model::{Device, DeviceId};

/// Per-category and per-status device counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetStats {
    pub total: usize,
    pub ambulance: usize,
    pub motorbike: usize,
    pub online: usize,
    pub offline: usize,
}

impl FleetStats {
    pub fn from_devices(devices: &[Device]) -> Self {
        devices.iter().fold(Self::default(), |mut stats, device| {
            stats.total += 1;
            match device.category() {
                Category::Ambulance => stats.ambulance += 1,
                Category::Motorbike => stats.motorbike += 1,
                Category::Generic => {}
            }
            if device.is_online() {
                stats.online += 1;
            } else {
                stats.offline += 1;
            }
            stats
        })
    }
}

/// One row of the device list.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSummary {
    pub id: DeviceId,
    pub name: String,
    pub category: Category,
    pub online: bool,
}

impl DeviceSummary {
    pub fn glyph(&self) -> &'static str {
        self.category.glyph()
    }
}

impl From<&Device> for DeviceSummary {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id,
            name: device.name.clone(),
            category: device.category(),
            online: device.is_online(),
        }
    }
}
