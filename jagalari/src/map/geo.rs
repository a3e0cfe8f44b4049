//! Geographic primitives shared by every overlay component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and within WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Geographic bounding box.
///
/// Built incrementally with [`GeoBounds::from_point`] and [`GeoBounds::expand`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Zero-area bounds around a single point.
    pub fn from_point(lat: f64, lon: f64) -> Self {
        Self {
            min_lat: lat,
            max_lat: lat,
            min_lon: lon,
            max_lon: lon,
        }
    }

    /// Bounds covering every coordinate, or `None` for an empty iterator.
    pub fn covering<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = coordinates.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::from_point(first.latitude, first.longitude);
        for c in iter {
            bounds.expand(c.latitude, c.longitude);
        }
        Some(bounds)
    }

    /// Grow the bounds to include a point.
    pub fn expand(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    /// Extend each side by `ratio` of the current span.
    ///
    /// `0.2` adds 20% of the height above and below, and 20% of the width
    /// left and right.
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_pad = self.height() * ratio;
        let lon_pad = self.width() * ratio;
        Self {
            min_lat: self.min_lat - lat_pad,
            max_lat: self.max_lat + lat_pad,
            min_lon: self.min_lon - lon_pad,
            max_lon: self.max_lon + lon_pad,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// A box that cannot be fitted: a single point, or non-finite edges.
    ///
    /// A row of points along one parallel or meridian is not degenerate;
    /// widen it with [`GeoBounds::with_min_span`] before fitting.
    pub fn is_degenerate(&self) -> bool {
        let finite = [self.min_lat, self.max_lat, self.min_lon, self.max_lon]
            .iter()
            .all(|v| v.is_finite());
        !finite || (self.width() <= f64::EPSILON && self.height() <= f64::EPSILON)
    }

    /// Widen any axis narrower than `span` degrees, keeping its centre.
    pub fn with_min_span(&self, span: f64) -> Self {
        let mut widened = *self;
        if self.height() < span {
            let mid = (self.min_lat + self.max_lat) / 2.0;
            widened.min_lat = mid - span / 2.0;
            widened.max_lat = mid + span / 2.0;
        }
        if self.width() < span {
            let mid = (self.min_lon + self.max_lon) / 2.0;
            widened.min_lon = mid - span / 2.0;
            widened.max_lon = mid + span / 2.0;
        }
        widened
    }

    pub fn contains(&self, c: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.latitude)
            && (self.min_lon..=self.max_lon).contains(&c.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covering_empty_is_none() {
        let coords: Vec<Coordinate> = Vec::new();
        assert!(GeoBounds::covering(&coords).is_none());
    }

    #[test]
    fn test_covering_expands_to_all_points() {
        let coords = [
            Coordinate::new(-6.20, 106.84),
            Coordinate::new(-6.30, 106.90),
            Coordinate::new(-6.10, 106.80),
        ];
        let bounds = GeoBounds::covering(&coords).unwrap();

        assert_eq!(bounds.min_lat, -6.30);
        assert_eq!(bounds.max_lat, -6.10);
        assert_eq!(bounds.min_lon, 106.80);
        assert_eq!(bounds.max_lon, 106.90);
        assert!(coords.iter().all(|c| bounds.contains(c)));
    }

    #[test]
    fn test_pad_grows_each_side_by_ratio() {
        let bounds = GeoBounds {
            min_lat: 0.0,
            max_lat: 10.0,
            min_lon: 20.0,
            max_lon: 40.0,
        };
        let padded = bounds.pad(0.2);

        assert!((padded.min_lat - -2.0).abs() < 1e-9);
        assert!((padded.max_lat - 12.0).abs() < 1e-9);
        assert!((padded.min_lon - 16.0).abs() < 1e-9);
        assert!((padded.max_lon - 44.0).abs() < 1e-9);
        assert_eq!(padded.center(), bounds.center());
    }

    #[test]
    fn test_single_point_is_degenerate() {
        let bounds = GeoBounds::from_point(-6.2, 106.8);
        assert!(bounds.is_degenerate());
        assert!(bounds.pad(0.2).is_degenerate());
    }

    #[test]
    fn test_points_on_one_parallel_can_be_fitted() {
        let coords = [Coordinate::new(1.0, 10.0), Coordinate::new(1.0, 11.0)];
        let bounds = GeoBounds::covering(&coords).unwrap();

        assert!(!bounds.is_degenerate());

        let widened = bounds.with_min_span(0.01);
        assert!((widened.height() - 0.01).abs() < 1e-12);
        assert_eq!(widened.width(), 1.0);
        assert!((widened.center().latitude - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_span_leaves_wide_bounds_alone() {
        let bounds = GeoBounds {
            min_lat: 0.0,
            max_lat: 1.0,
            min_lon: 0.0,
            max_lon: 2.0,
        };
        assert_eq!(bounds.with_min_span(0.01), bounds);
    }

    #[test]
    fn test_nan_bounds_are_degenerate() {
        let mut bounds = GeoBounds::from_point(0.0, 0.0);
        bounds.max_lat = f64::NAN;
        assert!(bounds.is_degenerate());
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(Coordinate::new(-6.2, 106.8).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, f64::INFINITY).is_valid());
    }
}
