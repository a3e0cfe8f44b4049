//! Map surface abstraction.
//!
//! - [`geo`] - `Coordinate` and `GeoBounds`
//! - [`surface`] - the `MapSurface` trait and the specs drawn through it
//! - [`headless`] - `HeadlessMapSurface`, an in-memory implementation

mod geo;
mod headless;
mod surface;

pub use geo::{Coordinate, GeoBounds};
pub use headless::{HeadlessMapSurface, SurfaceOp, SurfaceOpCounts, Viewport, OP_LOG_CAPACITY};
pub use surface::{
    MapSurface, MarkerHandle, MarkerIcon, MarkerSpec, Shape, ShapeHandle, ShapeStyle,
    SurfaceError, OFFLINE_COLOR, ONLINE_COLOR, SELF_LOCATION_COLOR,
};

/// Zoom used when centring on a single device or a failed fit.
pub const SINGLE_POINT_ZOOM: u8 = 15;

/// Zoom used after a successful self-location fix.
pub const LOCATED_ZOOM: u8 = 16;

/// Viewport used when nothing is known yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultViewport {
    pub center: Coordinate,
    pub zoom: u8,
}

impl Default for DefaultViewport {
    /// Central Jakarta at city zoom.
    fn default() -> Self {
        Self {
            center: Coordinate::new(-6.2088, 106.8456),
            zoom: 13,
        }
    }
}
