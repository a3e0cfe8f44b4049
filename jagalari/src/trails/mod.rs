//! Trail Overlay Manager - per-device "recently here" indicators.
//!
//! Only the latest position of each device is available, so a trail is a
//! fixed-radius disc at the last known position rather than a path of
//! history. The overlay is toggled globally:
//!
//! - enabling draws one disc per resolved fix of the current snapshot
//! - each new snapshot replaces the disc of every device it reports and
//!   drops discs of devices it no longer resolves
//! - disabling removes every disc
//!
//! Colours come from a fixed palette indexed by device id, so a device keeps
//! its colour across ticks.

use std::collections::{HashMap, HashSet};

use crate::fleet::{DeviceId, Snapshot};
use crate::map::{MapSurface, Shape, ShapeHandle, ShapeStyle};

/// Trail colours, indexed by `device_id` modulo the palette length.
pub const TRAIL_PALETTE: &[&str] = &[
    "#3b82f6", "#f59e0b", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316", "#84cc16", "#6366f1",
];

/// Ground radius of a trail disc.
pub const TRAIL_RADIUS_M: f64 = 150.0;

/// One rendered trail disc.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailEntry {
    pub device_id: DeviceId,
    pub color_index: usize,
    pub handle: ShapeHandle,
}

/// Palette slot of a device.
pub fn color_index(device_id: DeviceId) -> usize {
    device_id.rem_euclid(TRAIL_PALETTE.len() as i64) as usize
}

/// Owner of every trail disc on the map.
#[derive(Debug, Default)]
pub struct TrailOverlayManager {
    enabled: bool,
    entries: HashMap<DeviceId, TrailEntry>,
}

impl TrailOverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch trails on or off.
    ///
    /// Switching on draws trails for `snapshot`; switching off removes them
    /// all. Setting the current value again is a no-op.
    pub fn set_enabled<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        enabled: bool,
        snapshot: Option<&Snapshot>,
    ) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;

        if enabled {
            tracing::info!("Trails enabled");
            if let Some(snapshot) = snapshot {
                self.refresh(surface, snapshot);
            }
        } else {
            tracing::info!(trails = self.entries.len(), "Trails disabled");
            self.clear(surface);
        }
    }

    /// Redraw the trail of every device in `snapshot`. No-op while disabled.
    pub fn refresh<M: MapSurface + ?Sized>(&mut self, surface: &mut M, snapshot: &Snapshot) {
        if !self.enabled {
            return;
        }

        let fixes = snapshot.resolve();
        let seen: HashSet<DeviceId> = fixes.iter().map(|f| f.device.id).collect();

        let stale: Vec<DeviceId> = self
            .entries
            .keys()
            .filter(|id| !seen.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(entry) = self.entries.remove(&id) {
                surface.remove_shape(entry.handle);
            }
        }

        for fix in fixes {
            let device_id = fix.device.id;
            if let Some(previous) = self.entries.remove(&device_id) {
                surface.remove_shape(previous.handle);
            }

            let index = color_index(device_id);
            let shape = Shape::Circle {
                center: fix.position.coordinate(),
                radius_m: TRAIL_RADIUS_M,
                style: ShapeStyle {
                    color: TRAIL_PALETTE[index].to_string(),
                    weight: 2.0,
                    opacity: 0.35,
                },
            };

            match surface.add_shape(&shape) {
                Ok(handle) => {
                    self.entries.insert(
                        device_id,
                        TrailEntry {
                            device_id,
                            color_index: index,
                            handle,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(device_id, error = %e, "Failed to draw trail");
                }
            }
        }
    }

    /// Remove every trail and forget them.
    pub fn clear<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        for (_, entry) in self.entries.drain() {
            surface.remove_shape(entry.handle);
        }
    }

    pub fn get(&self, device_id: DeviceId) -> Option<&TrailEntry> {
        self.entries.get(&device_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::fixtures::{device, position};
    use crate::map::HeadlessMapSurface;

    fn two_devices() -> Snapshot {
        Snapshot::new(
            vec![device(1, "A", "online"), device(2, "B", "online")],
            vec![position(1, 1.0, 1.0), position(2, 2.0, 2.0)],
        )
    }

    #[test]
    fn test_color_index_is_stable_and_wraps() {
        let n = TRAIL_PALETTE.len() as i64;
        assert_eq!(color_index(3), 3);
        assert_eq!(color_index(3 + n), 3);
        assert_eq!(color_index(-1), TRAIL_PALETTE.len() - 1);
    }

    #[test]
    fn test_enable_draws_one_disc_per_fix() {
        let mut surface = HeadlessMapSurface::new();
        let mut trails = TrailOverlayManager::new();

        trails.set_enabled(&mut surface, true, Some(&two_devices()));

        assert_eq!(trails.len(), 2);
        assert_eq!(surface.shape_count(), 2);
        assert_eq!(trails.get(2).unwrap().color_index, 2);
    }

    #[test]
    fn test_refresh_replaces_per_device() {
        let mut surface = HeadlessMapSurface::new();
        let mut trails = TrailOverlayManager::new();
        trails.set_enabled(&mut surface, true, Some(&two_devices()));
        let old_handle = trails.get(1).unwrap().handle;

        let moved = Snapshot::new(
            vec![device(1, "A", "online"), device(2, "B", "online")],
            vec![position(1, 1.5, 1.5), position(2, 2.0, 2.0)],
        );
        trails.refresh(&mut surface, &moved);

        assert_eq!(trails.len(), 2);
        assert_eq!(surface.shape_count(), 2);
        assert_ne!(trails.get(1).unwrap().handle, old_handle);
        assert!(surface.shape(old_handle).is_none());
    }

    #[test]
    fn test_refresh_drops_vanished_devices() {
        let mut surface = HeadlessMapSurface::new();
        let mut trails = TrailOverlayManager::new();
        trails.set_enabled(&mut surface, true, Some(&two_devices()));

        let only_one = Snapshot::new(vec![device(1, "A", "online")], vec![position(1, 1.0, 1.0)]);
        trails.refresh(&mut surface, &only_one);

        assert!(trails.get(2).is_none());
        assert_eq!(surface.shape_count(), 1);
    }

    #[test]
    fn test_disable_tears_everything_down() {
        let mut surface = HeadlessMapSurface::new();
        let mut trails = TrailOverlayManager::new();
        trails.set_enabled(&mut surface, true, Some(&two_devices()));

        trails.set_enabled(&mut surface, false, None);

        assert!(trails.is_empty());
        assert_eq!(surface.shape_count(), 0);
    }

    #[test]
    fn test_refresh_while_disabled_is_noop() {
        let mut surface = HeadlessMapSurface::new();
        let mut trails = TrailOverlayManager::new();

        trails.refresh(&mut surface, &two_devices());

        assert!(trails.is_empty());
        assert_eq!(surface.counts().shapes_added, 0);
    }
}
