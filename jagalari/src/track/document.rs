//! GPX track documents: structural validation and geometry extraction.
//!
//! Validation is a cheap pre-check run before the XML parser ever sees the
//! document. It catches empty uploads and files that are obviously not GPX
//! so they can be rejected without counting as a parse failure.

use std::io::Cursor;

use super::error::TrackError;
use crate::map::{Coordinate, GeoBounds};

/// Shortest document that can hold a GPX root element with one point.
pub const MIN_DOCUMENT_LEN: usize = 64;

/// Root element every GPX document carries.
pub const ROOT_MARKER: &str = "<gpx";

/// Check length and root marker without parsing.
pub fn validate(raw: &str) -> Result<(), TrackError> {
    let trimmed = raw.trim();
    if trimmed.len() < MIN_DOCUMENT_LEN {
        return Err(TrackError::Malformed(format!(
            "document is {} bytes, expected at least {}",
            trimmed.len(),
            MIN_DOCUMENT_LEN
        )));
    }
    if !trimmed.to_ascii_lowercase().contains(ROOT_MARKER) {
        return Err(TrackError::Malformed(format!(
            "missing {ROOT_MARKER} root element"
        )));
    }
    Ok(())
}

/// Drawable content of a GPX document.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackGeometry {
    /// Name of the first named track or route.
    pub name: Option<String>,
    /// Track segments and routes, one polyline each.
    pub paths: Vec<Vec<Coordinate>>,
    /// Standalone waypoints.
    pub waypoints: Vec<Coordinate>,
    pub bounds: GeoBounds,
}

impl TrackGeometry {
    pub fn point_count(&self) -> usize {
        self.paths.iter().map(Vec::len).sum::<usize>() + self.waypoints.len()
    }
}

/// Parse a GPX document into drawable geometry.
pub fn parse(raw: &str) -> Result<TrackGeometry, TrackError> {
    let gpx = gpx::read(Cursor::new(raw.as_bytes())).map_err(|e| TrackError::Parse(e.to_string()))?;

    let to_coordinate = |wp: &gpx::Waypoint| {
        let point = wp.point();
        Coordinate::new(point.y(), point.x())
    };

    let mut name = None;
    let mut paths = Vec::new();

    for track in &gpx.tracks {
        if name.is_none() {
            name = track.name.clone();
        }
        for segment in &track.segments {
            let path: Vec<Coordinate> = segment.points.iter().map(to_coordinate).collect();
            if !path.is_empty() {
                paths.push(path);
            }
        }
    }

    for route in &gpx.routes {
        if name.is_none() {
            name = route.name.clone();
        }
        let path: Vec<Coordinate> = route.points.iter().map(to_coordinate).collect();
        if !path.is_empty() {
            paths.push(path);
        }
    }

    let waypoints: Vec<Coordinate> = gpx.waypoints.iter().map(to_coordinate).collect();

    let bounds = GeoBounds::covering(paths.iter().flatten().chain(waypoints.iter()))
        .ok_or(TrackError::EmptyGeometry)?;

    Ok(TrackGeometry {
        name,
        paths,
        waypoints,
        bounds,
    })
}

#[cfg(test)]
pub(crate) mod samples {
    /// A two-segment track around Monas, Jakarta.
    pub const TRACK_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="jagalari-tests" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Monas loop</name>
    <trkseg>
      <trkpt lat="-6.1754" lon="106.8272"></trkpt>
      <trkpt lat="-6.1760" lon="106.8290"></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="-6.1770" lon="106.8300"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    /// Passes structural validation but is not well-formed XML.
    pub const BROKEN_GPX: &str = r#"<?xml version="1.0"?>
<gpx version="1.1" creator="jagalari-tests"><trk><trkseg><trkpt lat="-6.1" lon="106.8">
</trkseg></gpx>"#;

    /// Well-formed GPX with no points.
    pub const EMPTY_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="jagalari-tests" xmlns="http://www.topografix.com/GPX/1/1"></gpx>"#;
}
