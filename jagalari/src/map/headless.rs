//! In-memory map surface.
//!
//! [`HeadlessMapSurface`] keeps rendered state in plain collections instead of
//! drawing it. It backs the CLI's headless run and every test that needs to
//! observe what the engine asked the map to do.
//!
//! # Failure Injection
//!
//! Real map libraries occasionally throw while fitting degenerate bounds or
//! drawing broken geometry. `fail_fit_bounds` and `fail_add_shape` reproduce
//! that so the degraded paths can be exercised.

use std::collections::{HashMap, VecDeque};

use super::geo::{Coordinate, GeoBounds};
use super::surface::{MapSurface, MarkerHandle, MarkerSpec, Shape, ShapeHandle, SurfaceError};

/// The last viewport request the surface received.
#[derive(Debug, Clone, PartialEq)]
pub enum Viewport {
    /// No viewport request yet.
    Unset,
    /// Fitted to a region.
    Fitted(GeoBounds),
    /// Centred on a point.
    Centered { center: Coordinate, zoom: u8 },
}

/// Counters of every primitive invoked on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceOpCounts {
    pub markers_added: usize,
    pub markers_updated: usize,
    pub markers_removed: usize,
    pub shapes_added: usize,
    pub shapes_removed: usize,
    pub fits: usize,
    pub set_views: usize,
}

/// Operations kept in the surface's log before the oldest are dropped.
pub const OP_LOG_CAPACITY: usize = 1024;

/// One primitive invoked on the surface, in call order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceOp {
    AddMarker(MarkerHandle),
    UpdateMarker(MarkerHandle),
    RemoveMarker(MarkerHandle),
    AddShape(ShapeHandle),
    RemoveShape(ShapeHandle),
    FitBounds,
    SetView,
}

/// Map surface that records state in memory.
#[derive(Debug)]
pub struct HeadlessMapSurface {
    markers: HashMap<MarkerHandle, MarkerSpec>,
    shapes: HashMap<ShapeHandle, Shape>,
    viewport: Viewport,
    counts: SurfaceOpCounts,
    ops: VecDeque<SurfaceOp>,
    next_handle: u64,

    /// When true, `fit_bounds` returns an error.
    pub fail_fit_bounds: bool,

    /// When true, `add_shape` returns an error.
    pub fail_add_shape: bool,
}

impl Default for HeadlessMapSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessMapSurface {
    pub fn new() -> Self {
        Self {
            markers: HashMap::new(),
            shapes: HashMap::new(),
            viewport: Viewport::Unset,
            counts: SurfaceOpCounts::default(),
            ops: VecDeque::new(),
            next_handle: 1,
            fail_fit_bounds: false,
            fail_add_shape: false,
        }
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<&MarkerSpec> {
        self.markers.get(&handle)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn markers(&self) -> impl Iterator<Item = (&MarkerHandle, &MarkerSpec)> {
        self.markers.iter()
    }

    pub fn shape(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(&handle)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> impl Iterator<Item = (&ShapeHandle, &Shape)> {
        self.shapes.iter()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn counts(&self) -> SurfaceOpCounts {
        self.counts
    }

    /// The most recent operations, oldest first.
    pub fn ops(&self) -> impl Iterator<Item = &SurfaceOp> {
        self.ops.iter()
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    fn record(&mut self, op: SurfaceOp) {
        if self.ops.len() == OP_LOG_CAPACITY {
            self.ops.pop_front();
        }
        self.ops.push_back(op);
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }
}

impl MapSurface for HeadlessMapSurface {
    fn add_marker(&mut self, spec: &MarkerSpec) -> MarkerHandle {
        let handle = MarkerHandle(self.next_id());
        tracing::debug!(%handle, label = %spec.label, at = %spec.coordinate, "add marker");
        self.markers.insert(handle, spec.clone());
        self.counts.markers_added += 1;
        self.record(SurfaceOp::AddMarker(handle));
        handle
    }

    fn update_marker(&mut self, handle: MarkerHandle, spec: &MarkerSpec) {
        match self.markers.get_mut(&handle) {
            Some(existing) => {
                *existing = spec.clone();
                self.counts.markers_updated += 1;
                self.record(SurfaceOp::UpdateMarker(handle));
            }
            None => tracing::warn!(%handle, "update of unknown marker ignored"),
        }
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_some() {
            tracing::debug!(%handle, "remove marker");
            self.counts.markers_removed += 1;
            self.record(SurfaceOp::RemoveMarker(handle));
        }
    }

    fn add_shape(&mut self, shape: &Shape) -> Result<ShapeHandle, SurfaceError> {
        if self.fail_add_shape {
            return Err(SurfaceError::RenderFailed("injected failure".to_string()));
        }
        let handle = ShapeHandle(self.next_id());
        tracing::debug!(%handle, "add shape");
        self.shapes.insert(handle, shape.clone());
        self.counts.shapes_added += 1;
        self.record(SurfaceOp::AddShape(handle));
        Ok(handle)
    }

    fn remove_shape(&mut self, handle: ShapeHandle) {
        if self.shapes.remove(&handle).is_some() {
            tracing::debug!(%handle, "remove shape");
            self.counts.shapes_removed += 1;
            self.record(SurfaceOp::RemoveShape(handle));
        }
    }

    fn fit_bounds(&mut self, bounds: &GeoBounds) -> Result<(), SurfaceError> {
        if self.fail_fit_bounds {
            return Err(SurfaceError::FitFailed("injected failure".to_string()));
        }
        if bounds.is_degenerate() {
            return Err(SurfaceError::FitFailed("bounds have no area".to_string()));
        }
        self.viewport = Viewport::Fitted(*bounds);
        self.counts.fits += 1;
        self.record(SurfaceOp::FitBounds);
        Ok(())
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        tracing::debug!(%center, zoom, "set view");
        self.viewport = Viewport::Centered { center, zoom };
        self.counts.set_views += 1;
        self.record(SurfaceOp::SetView);
    }

    fn viewport_bounds(&self) -> Option<GeoBounds> {
        match &self.viewport {
            Viewport::Unset => None,
            Viewport::Fitted(bounds) => Some(*bounds),
            Viewport::Centered { center, zoom } => {
                // One 256px tile spans 360 / 2^zoom degrees of longitude.
                let half_span = 180.0 / f64::from(1u32 << (*zoom).min(30));
                let mut bounds = GeoBounds::from_point(
                    center.latitude - half_span / 2.0,
                    center.longitude - half_span,
                );
                bounds.expand(
                    center.latitude + half_span / 2.0,
                    center.longitude + half_span,
                );
                Some(bounds)
            }
        }
    }
}
