//! Track overlay state machine with a failure circuit breaker.
//!
//! # State Machine
//!
//! ```text
//! Empty    --[set_document(doc)]----------> Rendering
//! Rendering --[parsed + drawn]------------> Loaded
//! Rendering --[parse/render error]--------> Failed   (failures += 1)
//! any      --[set_document(None)]---------> Empty
//! any      --[failures >= threshold]------> Disabled
//! Disabled --[reset_failures()]-----------> Empty | Loaded | Failed
//! ```
//!
//! While disabled, documents are still accepted and stored but never handed
//! to the parser. Clearing the document does not reset the failure count.

use super::document::{self, TrackGeometry};
use super::error::TrackError;
use crate::map::{Coordinate, GeoBounds, MapSurface, Shape, ShapeHandle, ShapeStyle};

/// Consecutive counted failures that disable rendering.
pub const FAILURE_THRESHOLD: u32 = 3;

/// Zoom used when fitting to the track fails and the view is centred instead.
pub const TRACK_FALLBACK_ZOOM: u8 = 13;

/// Stroke colour of the track polyline.
pub const TRACK_COLOR: &str = "#dc2626";

/// Observable state of the track overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    /// No document.
    Empty,
    /// A document is being loaded or parsed.
    Rendering,
    /// The overlay is on the map.
    Loaded,
    /// The last document failed to parse or render.
    Failed,
    /// Too many consecutive failures; documents are not rendered.
    Disabled,
}

impl TrackStatus {
    pub fn display_status(&self) -> &'static str {
        match self {
            TrackStatus::Empty => "No track",
            TrackStatus::Rendering => "Loading...",
            TrackStatus::Loaded => "Loaded",
            TrackStatus::Failed => "Failed",
            TrackStatus::Disabled => "Disabled",
        }
    }
}

/// Result of handing a document to [`TrackOverlayManager::set_document`].
#[derive(Debug)]
pub enum DocumentOutcome {
    /// The document was removed.
    Cleared,
    /// Structural validation failed; state is unchanged.
    Rejected(TrackError),
    /// The overlay was drawn.
    Rendered { bounds: GeoBounds, points: usize },
    /// Parsing or drawing failed and was counted.
    Failed(TrackError),
    /// The breaker is open; the document was stored but not rendered.
    Suppressed,
}

/// Result of [`TrackOverlayManager::fit_to_track`].
#[derive(Debug, Clone, PartialEq)]
pub enum TrackFit {
    /// There is no rendered region to fit to.
    NoRegion,
    Fitted(GeoBounds),
    /// Fitting failed; the view was centred on the track instead.
    Centered(Coordinate),
}

/// Owner of the uploaded track document and its overlay.
#[derive(Debug)]
pub struct TrackOverlayManager {
    raw: Option<String>,
    file_name: Option<String>,
    geometry: Option<TrackGeometry>,
    handle: Option<ShapeHandle>,
    phase: TrackStatus,
    consecutive_failures: u32,
}

impl Default for TrackOverlayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackOverlayManager {
    pub fn new() -> Self {
        Self {
            raw: None,
            file_name: None,
            geometry: None,
            handle: None,
            phase: TrackStatus::Empty,
            consecutive_failures: 0,
        }
    }

    pub fn status(&self) -> TrackStatus {
        if self.is_disabled() {
            TrackStatus::Disabled
        } else {
            self.phase
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.consecutive_failures >= FAILURE_THRESHOLD
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn document(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn set_file_name(&mut self, file_name: Option<String>) {
        self.file_name = file_name;
    }

    pub fn geometry(&self) -> Option<&TrackGeometry> {
        self.geometry.as_ref()
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.geometry.as_ref().map(|g| g.bounds)
    }

    pub fn handle(&self) -> Option<ShapeHandle> {
        self.handle
    }

    /// Mark an asynchronous load as started.
    pub fn begin_load(&mut self) {
        if !self.is_disabled() {
            self.phase = TrackStatus::Rendering;
        }
    }

    /// Replace the current document, or remove it with `None`.
    ///
    /// The previous overlay is always torn down before anything new is drawn,
    /// so at most one track overlay exists.
    pub fn set_document<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        raw: Option<&str>,
    ) -> DocumentOutcome {
        let raw = match raw {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                self.teardown(surface);
                self.raw = None;
                self.file_name = None;
                self.phase = TrackStatus::Empty;
                tracing::info!("Track cleared");
                return DocumentOutcome::Cleared;
            }
        };

        if let Err(e) = document::validate(raw) {
            tracing::warn!(error = %e, "Rejected track document");
            return DocumentOutcome::Rejected(e);
        }

        self.teardown(surface);
        self.raw = Some(raw.to_string());

        if self.is_disabled() {
            tracing::warn!(
                failures = self.consecutive_failures,
                "Track rendering disabled, document stored without rendering"
            );
            return DocumentOutcome::Suppressed;
        }

        self.phase = TrackStatus::Rendering;
        self.render(surface)
    }

    /// Count a failure that happened before the document reached the parser.
    ///
    /// Structural rejects leave the current overlay as it was. Counted
    /// failures remove it, as a failed replacement does in
    /// [`set_document`](Self::set_document), so `Failed` never has an
    /// overlay on the map.
    pub fn record_load_failure<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        error: &TrackError,
    ) {
        if !error.counts_toward_breaker() {
            if self.phase == TrackStatus::Rendering {
                self.phase = if self.handle.is_some() {
                    TrackStatus::Loaded
                } else {
                    TrackStatus::Empty
                };
            }
            return;
        }
        self.teardown(surface);
        self.record_failure(error);
    }

    /// Move the view to the rendered track.
    pub fn fit_to_track<M: MapSurface + ?Sized>(&self, surface: &mut M) -> TrackFit {
        let Some(bounds) = self.handle.and(self.bounds()) else {
            return TrackFit::NoRegion;
        };

        match surface.fit_bounds(&bounds) {
            Ok(()) => TrackFit::Fitted(bounds),
            Err(e) => {
                let center = bounds.center();
                tracing::warn!(error = %e, center = %center, "Fit to track failed, centring instead");
                surface.set_view(center, TRACK_FALLBACK_ZOOM);
                TrackFit::Centered(center)
            }
        }
    }

    /// Close the breaker.
    ///
    /// A document stored while disabled is rendered immediately.
    pub fn reset_failures<M: MapSurface + ?Sized>(&mut self, surface: &mut M) -> Option<DocumentOutcome> {
        let was_disabled = self.is_disabled();
        self.consecutive_failures = 0;
        tracing::info!("Track failure count reset");

        if was_disabled && self.raw.is_some() && self.handle.is_none() {
            self.phase = TrackStatus::Rendering;
            return Some(self.render(surface));
        }
        None
    }

    /// Remove the document and its overlay.
    pub fn clear<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        self.set_document(surface, None);
    }

    fn render<M: MapSurface + ?Sized>(&mut self, surface: &mut M) -> DocumentOutcome {
        let Some(raw) = self.raw.as_deref() else {
            self.phase = TrackStatus::Empty;
            return DocumentOutcome::Cleared;
        };

        let geometry = match document::parse(raw) {
            Ok(geometry) => geometry,
            Err(e) => {
                self.record_failure(&e);
                return DocumentOutcome::Failed(e);
            }
        };

        let shape = Shape::Polyline {
            paths: geometry.paths.clone(),
            waypoints: geometry.waypoints.clone(),
            style: ShapeStyle {
                color: TRACK_COLOR.to_string(),
                weight: 4.0,
                opacity: 0.8,
            },
        };

        match surface.add_shape(&shape) {
            Ok(handle) => {
                let bounds = geometry.bounds;
                let points = geometry.point_count();
                tracing::info!(
                    name = geometry.name.as_deref().unwrap_or("-"),
                    points,
                    "Track rendered"
                );
                self.handle = Some(handle);
                self.geometry = Some(geometry);
                self.phase = TrackStatus::Loaded;
                DocumentOutcome::Rendered { bounds, points }
            }
            Err(e) => {
                let e = TrackError::from(e);
                self.record_failure(&e);
                DocumentOutcome::Failed(e)
            }
        }
    }

    fn record_failure(&mut self, error: &TrackError) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.phase = TrackStatus::Failed;
        tracing::warn!(
            error = %error,
            failures = self.consecutive_failures,
            threshold = FAILURE_THRESHOLD,
            "Track failed"
        );
        if self.is_disabled() {
            tracing::error!("Track rendering disabled after repeated failures");
        }
    }

    fn teardown<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        if let Some(handle) = self.handle.take() {
            surface.remove_shape(handle);
        }
        self.geometry = None;
    }
}
