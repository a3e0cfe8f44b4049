//! Marker Reconciler - keeps device markers in step with the latest snapshot.
//!
//! # Algorithm
//!
//! Each pass resolves the snapshot into `(Device, Position)` fixes, builds the
//! desired marker set keyed by device id, and diffs it against the markers
//! already on the map:
//!
//! 1. markers absent from the desired set are removed (handle released)
//! 2. devices seen for the first time get a new marker
//! 3. devices already on the map are updated in place, keeping their handle
//!    (and anything the surface attached to it, such as an open popup)
//!
//! Removals always run before creations, so the map never shows two markers
//! for one device id.
//!
//! # Viewport
//!
//! After the marker set is applied, the view is fitted to the padded bounds
//! of all fixes; a fleet strung along one parallel or meridian has its flat
//! axis widened first. A single point or a failing fit falls back to centring on
//! the first fix; an empty fleet falls back to the default viewport. Viewport
//! trouble never undoes the marker changes already made.

use std::collections::{HashMap, HashSet};

use crate::fleet::{Category, DeviceId, ResolvedFix, Snapshot};
use crate::map::{
    Coordinate, DefaultViewport, GeoBounds, MapSurface, MarkerHandle, MarkerIcon, MarkerSpec,
    SINGLE_POINT_ZOOM,
};

/// Reserved marker id of the self-location marker, outside the device id space.
pub const SELF_LOCATION_ID: DeviceId = -1;

/// Marker labels longer than this many characters are truncated.
pub const LABEL_MAX_CHARS: usize = 12;

/// Fraction of the fleet's span added on each side when fitting the view.
pub const FIT_PADDING: f64 = 0.2;

/// Narrowest span, in degrees, of a fitted fleet view (roughly 1 km).
pub const MIN_FIT_SPAN_DEG: f64 = 0.01;

/// Label shown on the self-location marker.
const SELF_LOCATION_LABEL: &str = "You";

/// One rendered marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEntry {
    pub device_id: DeviceId,
    /// `None` for the self-location marker.
    pub category: Option<Category>,
    pub online: bool,
    pub coordinate: Coordinate,
    pub label: String,
    pub handle: MarkerHandle,
}

/// Why the viewport fell back to a centred view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// All fixes share one point, so there is no region to fit.
    DegenerateBounds,
    /// The surface failed to fit a valid region.
    FitFailed,
}

/// Viewport outcome of a reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportDecision {
    /// Fitted to the padded fleet bounds.
    Fitted(GeoBounds),
    /// Centred on the first fix.
    Centered {
        center: Coordinate,
        zoom: u8,
        reason: FallbackReason,
    },
    /// No fixes: default viewport.
    Default(DefaultViewport),
}

/// What a reconciliation pass changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileResult {
    pub created: Vec<DeviceId>,
    pub updated: Vec<DeviceId>,
    pub removed: Vec<DeviceId>,
    /// Markers already matching the snapshot; the surface was not touched.
    pub unchanged: usize,
    /// Positions that referenced no device in the snapshot.
    pub dropped_positions: usize,
    pub viewport: ViewportDecision,
}

impl ReconcileResult {
    /// True when the pass created or removed any marker.
    pub fn changed_membership(&self) -> bool {
        !self.created.is_empty() || !self.removed.is_empty()
    }
}

/// Owner of every device marker and the self-location marker.
#[derive(Debug)]
pub struct MarkerReconciler {
    markers: HashMap<DeviceId, MarkerEntry>,
    self_marker: Option<MarkerEntry>,
    default_viewport: DefaultViewport,
}

impl Default for MarkerReconciler {
    fn default() -> Self {
        Self::new(DefaultViewport::default())
    }
}

impl MarkerReconciler {
    pub fn new(default_viewport: DefaultViewport) -> Self {
        Self {
            markers: HashMap::new(),
            self_marker: None,
            default_viewport,
        }
    }

    /// Bring the markers on `surface` in line with `snapshot`.
    pub fn reconcile<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        snapshot: &Snapshot,
    ) -> ReconcileResult {
        let fixes = snapshot.resolve();
        let desired: Vec<(DeviceId, MarkerSpec)> = fixes.iter().map(desired_marker).collect();
        let desired_ids: HashSet<DeviceId> = desired.iter().map(|(id, _)| *id).collect();

        let mut removed: Vec<DeviceId> = self
            .markers
            .keys()
            .filter(|id| !desired_ids.contains(id))
            .copied()
            .collect();
        removed.sort_unstable();
        for id in &removed {
            if let Some(entry) = self.markers.remove(id) {
                surface.remove_marker(entry.handle);
            }
        }

        let mut created = Vec::new();
        let mut updated = Vec::new();
        let mut unchanged = 0;

        for ((id, spec), fix) in desired.iter().zip(&fixes) {
            let category = fix.device.category();
            let online = fix.device.is_online();

            match self.markers.get_mut(id) {
                Some(entry) => {
                    let same = entry.coordinate == spec.coordinate
                        && entry.online == online
                        && entry.category == Some(category)
                        && entry.label == spec.label;
                    if same {
                        unchanged += 1;
                        continue;
                    }
                    surface.update_marker(entry.handle, spec);
                    entry.category = Some(category);
                    entry.online = online;
                    entry.coordinate = spec.coordinate;
                    entry.label = spec.label.clone();
                    updated.push(*id);
                }
                None => {
                    let handle = surface.add_marker(spec);
                    self.markers.insert(
                        *id,
                        MarkerEntry {
                            device_id: *id,
                            category: Some(category),
                            online,
                            coordinate: spec.coordinate,
                            label: spec.label.clone(),
                            handle,
                        },
                    );
                    created.push(*id);
                }
            }
        }

        let coordinates: Vec<Coordinate> = desired.iter().map(|(_, s)| s.coordinate).collect();
        let viewport = self.update_viewport(surface, &coordinates);

        let result = ReconcileResult {
            created,
            updated,
            removed,
            unchanged,
            dropped_positions: snapshot.dangling_positions(),
            viewport,
        };

        tracing::debug!(
            markers = self.markers.len(),
            created = result.created.len(),
            updated = result.updated.len(),
            removed = result.removed.len(),
            unchanged = result.unchanged,
            dropped_positions = result.dropped_positions,
            "Markers reconciled"
        );

        result
    }

    fn update_viewport<M: MapSurface + ?Sized>(
        &self,
        surface: &mut M,
        coordinates: &[Coordinate],
    ) -> ViewportDecision {
        let Some(first) = coordinates.first().copied() else {
            surface.set_view(self.default_viewport.center, self.default_viewport.zoom);
            return ViewportDecision::Default(self.default_viewport);
        };

        let centered = |surface: &mut M, reason| {
            surface.set_view(first, SINGLE_POINT_ZOOM);
            ViewportDecision::Centered {
                center: first,
                zoom: SINGLE_POINT_ZOOM,
                reason,
            }
        };

        let bounds = match GeoBounds::covering(coordinates) {
            Some(b) if !b.is_degenerate() => b.with_min_span(MIN_FIT_SPAN_DEG).pad(FIT_PADDING),
            _ => return centered(surface, FallbackReason::DegenerateBounds),
        };

        match surface.fit_bounds(&bounds) {
            Ok(()) => ViewportDecision::Fitted(bounds),
            Err(e) => {
                tracing::warn!(error = %e, "Fit to fleet failed, centring on first device");
                centered(surface, FallbackReason::FitFailed)
            }
        }
    }

    /// Create or move the self-location marker.
    ///
    /// The marker is created once and updated in place afterwards.
    pub fn place_self_marker<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        coordinate: Coordinate,
        accuracy_m: Option<f64>,
    ) -> MarkerHandle {
        let spec = MarkerSpec {
            coordinate,
            icon: MarkerIcon::SelfLocation { accuracy_m },
            label: SELF_LOCATION_LABEL.to_string(),
        };

        match &mut self.self_marker {
            Some(entry) => {
                surface.update_marker(entry.handle, &spec);
                entry.coordinate = coordinate;
                entry.handle
            }
            None => {
                let handle = surface.add_marker(&spec);
                self.self_marker = Some(MarkerEntry {
                    device_id: SELF_LOCATION_ID,
                    category: None,
                    online: true,
                    coordinate,
                    label: spec.label,
                    handle,
                });
                handle
            }
        }
    }

    /// Release every marker this reconciler owns.
    pub fn clear<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        for (_, entry) in self.markers.drain() {
            surface.remove_marker(entry.handle);
        }
        if let Some(entry) = self.self_marker.take() {
            surface.remove_marker(entry.handle);
        }
    }

    pub fn get(&self, device_id: DeviceId) -> Option<&MarkerEntry> {
        self.markers.get(&device_id)
    }

    pub fn self_marker(&self) -> Option<&MarkerEntry> {
        self.self_marker.as_ref()
    }

    /// Number of device markers (the self-location marker is not counted).
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

fn desired_marker(fix: &ResolvedFix<'_>) -> (DeviceId, MarkerSpec) {
    let spec = MarkerSpec {
        coordinate: fix.position.coordinate(),
        icon: MarkerIcon::Device {
            category: fix.device.category(),
            online: fix.device.is_online(),
        },
        label: truncate_label(&fix.device.name),
    };
    (fix.device.id, spec)
}

/// Shorten a device name to [`LABEL_MAX_CHARS`] characters plus an ellipsis.
pub fn truncate_label(name: &str) -> String {
    if name.chars().count() > LABEL_MAX_CHARS {
        let head: String = name.chars().take(LABEL_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}
