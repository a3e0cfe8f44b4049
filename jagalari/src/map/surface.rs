//! Abstract map rendering surface.
//!
//! The engine never talks to a concrete mapping library. Every component
//! drives the map through [`MapSurface`], which exposes the handful of
//! primitives a slippy map offers: markers, shapes and the viewport.
//!
//! Handles returned by the surface are opaque. The component that created a
//! handle is its only owner; no component touches another's handles.

use std::fmt;

use thiserror::Error;

use super::geo::{Coordinate, GeoBounds};
use crate::fleet::Category;

/// Opaque identifier of a rendered marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

/// Opaque identifier of a rendered shape (disc, polyline layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub u64);

impl fmt::Display for MarkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

impl fmt::Display for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape#{}", self.0)
    }
}

/// Errors reported by a map surface.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SurfaceError {
    /// The surface could not fit the requested region.
    #[error("Cannot fit viewport to bounds: {0}")]
    FitFailed(String),

    /// The surface refused to draw a shape.
    #[error("Failed to render shape: {0}")]
    RenderFailed(String),
}

/// Visual of a marker.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerIcon {
    /// A fleet device, coloured by its online flag.
    Device { category: Category, online: bool },
    /// The operator's own position.
    ///
    /// `accuracy_m` is `None` for a placeholder restored from storage before
    /// any live fix was taken this session.
    SelfLocation { accuracy_m: Option<f64> },
}

impl MarkerIcon {
    /// Fill colour of the marker badge (CSS hex).
    pub fn color(&self) -> &'static str {
        match self {
            MarkerIcon::Device { online: true, .. } => ONLINE_COLOR,
            MarkerIcon::Device { online: false, .. } => OFFLINE_COLOR,
            MarkerIcon::SelfLocation { .. } => SELF_LOCATION_COLOR,
        }
    }

    /// Glyph drawn inside the badge.
    pub fn glyph(&self) -> &'static str {
        match self {
            MarkerIcon::Device { category, .. } => category.glyph(),
            MarkerIcon::SelfLocation { .. } => "🧍",
        }
    }
}

/// Badge colour of an online device.
pub const ONLINE_COLOR: &str = "#10b981";

/// Badge colour of an offline device.
pub const OFFLINE_COLOR: &str = "#ef4444";

/// Badge colour of the self-location marker.
pub const SELF_LOCATION_COLOR: &str = "#2563eb";

/// Everything a surface needs to draw or redraw a marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub coordinate: Coordinate,
    pub icon: MarkerIcon,
    pub label: String,
}

/// Stroke and fill of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub color: String,
    pub weight: f32,
    pub opacity: f32,
}

/// A drawable overlay shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A filled disc of fixed ground radius.
    Circle {
        center: Coordinate,
        radius_m: f64,
        style: ShapeStyle,
    },
    /// One or more polylines drawn as a single layer, plus point markers.
    Polyline {
        paths: Vec<Vec<Coordinate>>,
        waypoints: Vec<Coordinate>,
        style: ShapeStyle,
    },
}

/// Operations the engine needs from a map.
///
/// Implementations are driven from a single owner; `&mut self` everywhere.
pub trait MapSurface {
    /// Draw a new marker.
    fn add_marker(&mut self, spec: &MarkerSpec) -> MarkerHandle;

    /// Move or restyle an existing marker without recreating it.
    fn update_marker(&mut self, handle: MarkerHandle, spec: &MarkerSpec);

    /// Release a marker.
    fn remove_marker(&mut self, handle: MarkerHandle);

    /// Draw a shape.
    fn add_shape(&mut self, shape: &Shape) -> Result<ShapeHandle, SurfaceError>;

    /// Release a shape.
    fn remove_shape(&mut self, handle: ShapeHandle);

    /// Fit the viewport to a region.
    fn fit_bounds(&mut self, bounds: &GeoBounds) -> Result<(), SurfaceError>;

    /// Centre the viewport on a point at a zoom level.
    fn set_view(&mut self, center: Coordinate, zoom: u8);

    /// Currently visible region, if the surface knows it.
    fn viewport_bounds(&self) -> Option<GeoBounds>;
}
