use geo::{Distance, Haversine};
use geo_types::Point;
use serde::{Deserialize, Serialize};

use crate::TrackerError;

/// Used as the starting anchor when no device location is known yet.
pub const FALLBACK_COORDINATE: Coordinate = Coordinate {
    latitude: 37.785834,
    longitude: -122.406417,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Checked constructor, rejects non-finite and out of range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, TrackerError> {
        let coordinate = Self::new(latitude, longitude);
        coordinate.validate()?;
        Ok(coordinate)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(TrackerError::InvalidSample {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }

    /// Great-circle distance in meters on a spherical earth.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        Haversine.distance(Point::from(*self), Point::from(*other))
    }
}

impl From<Coordinate> for Point {
    fn from(coordinate: Coordinate) -> Self {
        Point::new(coordinate.longitude, coordinate.latitude)
    }
}

impl From<Point> for Coordinate {
    fn from(point: Point) -> Self {
        Coordinate::new(point.y(), point.x())
    }
}

#[test]
fn distance_along_equator() {
    let origin = Coordinate::new(0.0, 0.0);
    let east = Coordinate::new(0.0, 0.00047);

    // 0.00047 degrees of arc on the mean earth radius
    let distance = origin.distance_to(&east);
    assert!((distance - 52.26).abs() < 0.05, "got {distance}");
    assert_eq!(origin.distance_to(&origin), 0.0);
}

#[test]
fn distance_is_symmetric() {
    let copenhagen = Coordinate::new(55.6761, 12.5683);
    let aarhus = Coordinate::new(56.1629, 10.2039);

    let there = copenhagen.distance_to(&aarhus);
    let back = aarhus.distance_to(&copenhagen);
    assert!((there - back).abs() < 1e-6);
    // Roughly 157 km as the crow flies
    assert!((150_000.0..165_000.0).contains(&there), "got {there}");
}

#[test]
fn rejects_out_of_range() {
    assert!(Coordinate::try_new(91.0, 0.0).is_err());
    assert!(Coordinate::try_new(0.0, -180.5).is_err());
    assert!(Coordinate::try_new(f64::NAN, 0.0).is_err());
    assert!(Coordinate::try_new(0.0, f64::INFINITY).is_err());
    assert!(Coordinate::try_new(-90.0, 180.0).is_ok());
    assert!(FALLBACK_COORDINATE.is_valid());
}

#[test]
fn point_conversion_swaps_axes() {
    let coordinate = Coordinate::new(10.0, 20.0);
    let point = Point::from(coordinate);
    assert_eq!(point.x(), 20.0);
    assert_eq!(point.y(), 10.0);
    assert_eq!(Coordinate::from(point), coordinate);
}
