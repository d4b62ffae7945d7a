use serde::{Deserialize, Serialize};

use crate::{display, Coordinate, Waypoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedStatus {
    Active,
    Inactive,
}

/// All mutable state of one session. Only the tracker mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub initial_coordinate: Coordinate,
    /// Anchor for the next distance computation.
    pub last_recorded_coordinate: Coordinate,
    pub cumulative_distance_m: f64,
    pub waypoints: Vec<Waypoint>,
    pub has_first_waypoint: bool,
    pub elapsed_seconds: u64,
    pub current_speed_kmh: f64,
}

impl SessionState {
    pub fn new(anchor: Coordinate) -> Self {
        Self {
            initial_coordinate: anchor,
            last_recorded_coordinate: anchor,
            cumulative_distance_m: 0.0,
            waypoints: Vec::new(),
            has_first_waypoint: false,
            elapsed_seconds: 0,
            current_speed_kmh: 0.0,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            anchor: self.last_recorded_coordinate,
            cumulative_distance_m: self.cumulative_distance_m,
            current_speed_kmh: self.current_speed_kmh,
            elapsed_seconds: self.elapsed_seconds,
            waypoint_count: self.waypoints.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub anchor: Coordinate,
    pub cumulative_distance_m: f64,
    pub current_speed_kmh: f64,
    pub elapsed_seconds: u64,
    pub waypoint_count: usize,
}

impl SessionSnapshot {
    pub fn distance_km(&self) -> f64 {
        self.cumulative_distance_m / 1000.0
    }

    pub fn distance_label(&self) -> String {
        display::format_distance(self.cumulative_distance_m)
    }

    pub fn speed_label(&self) -> String {
        display::format_speed(self.current_speed_kmh)
    }

    pub fn elapsed_label(&self) -> String {
        display::format_elapsed(self.elapsed_seconds)
    }
}

/// Outcome of a single position update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdateResult {
    pub snapshot: SessionSnapshot,
    pub waypoint_created: bool,
    /// The waypoint that was recorded, kept even if the session was reset right after. After a
    /// reset it is the new session's origin and its cumulative distance is 0.
    pub waypoint: Option<Waypoint>,
    /// Set when the update restarted the session; the clock has to be restarted too.
    pub session_reset: bool,
}

#[test]
fn snapshot_of_new_session() {
    let anchor = Coordinate::new(55.0, 12.0);
    let snapshot = SessionState::new(anchor).snapshot();

    assert_eq!(snapshot.anchor, anchor);
    assert_eq!(snapshot.waypoint_count, 0);
    assert_eq!(snapshot.distance_km(), 0.0);
    assert_eq!(snapshot.distance_label(), "0.00 Km");
    assert_eq!(snapshot.speed_label(), "0 Km/h");
    assert_eq!(snapshot.elapsed_label(), "00:00");

    let json = serde_json::to_value(snapshot).unwrap();
    assert_eq!(json["elapsed_seconds"], 0);
    assert_eq!(json["anchor"]["latitude"], 55.0);
}
