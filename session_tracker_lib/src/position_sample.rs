use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Coordinate, TrackerError};

/// m/s to km/h
pub const KMH_PER_MPS: f64 = 3.6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub coordinate: Coordinate,
    pub reported_speed_mps: f64,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(coordinate: Coordinate, reported_speed_mps: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            reported_speed_mps,
            timestamp,
        }
    }

    /// Only the coordinate decides whether a sample is usable, a bad speed is treated as unknown.
    pub fn validate(&self) -> Result<(), TrackerError> {
        self.coordinate.validate()
    }

    /// `None` when the device did not report a usable speed. Devices report a negative speed
    /// when it is unknown.
    pub fn speed_kmh(&self) -> Option<f64> {
        (self.reported_speed_mps.is_finite() && self.reported_speed_mps > 0.0)
            .then(|| self.reported_speed_mps * KMH_PER_MPS)
    }
}

#[test]
fn speed_conversion() {
    let sample = PositionSample::new(Coordinate::new(0.0, 0.0), 10.0, Utc::now());
    assert_eq!(sample.speed_kmh(), Some(36.0));

    let standing = PositionSample::new(Coordinate::new(0.0, 0.0), 0.0, Utc::now());
    assert_eq!(standing.speed_kmh(), None);

    let unknown = PositionSample::new(Coordinate::new(0.0, 0.0), -1.0, Utc::now());
    assert_eq!(unknown.speed_kmh(), None);
    assert!(unknown.validate().is_ok());
}

#[test]
fn unusable_speed_is_unknown() {
    for speed in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let sample = PositionSample::new(Coordinate::new(0.0, 0.0), speed, Utc::now());
        assert!(sample.validate().is_ok());
        assert_eq!(sample.speed_kmh(), None);
    }
}
