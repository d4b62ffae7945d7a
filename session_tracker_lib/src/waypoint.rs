use serde::{Deserialize, Serialize};

use crate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub coordinate: Coordinate,
    pub distance_from_previous_m: f64,
    pub cumulative_distance_m: f64,
}

impl Waypoint {
    pub fn new(coordinate: Coordinate, distance_from_previous_m: f64, cumulative_distance_m: f64) -> Self {
        Self {
            coordinate,
            distance_from_previous_m,
            cumulative_distance_m,
        }
    }

    /// Label shown on the map pin.
    pub fn title(&self) -> String {
        format!("{}, {}", self.coordinate.latitude, self.coordinate.longitude)
    }

    pub fn subtitle(&self) -> String {
        format!("{:.2} Mts.", self.distance_from_previous_m)
    }
}

#[test]
fn pin_labels() {
    let waypoint = Waypoint::new(Coordinate::new(0.0, 0.00094), 52.2612, 104.5);
    assert_eq!(waypoint.title(), "0, 0.00094");
    assert_eq!(waypoint.subtitle(), "52.26 Mts.");
}
