use tracing::{debug, info, warn};

use crate::{
    Coordinate, FeedStatus, PositionSample, SessionSnapshot, SessionState, SessionUpdateResult,
    TrackerError, Waypoint, FALLBACK_COORDINATE,
};

/// Minimum displacement from the anchor that counts as real movement.
pub const MOVEMENT_THRESHOLD_M: f64 = 50.0;

/// Session state machine. Every mutation goes through `&mut self`, callers that
/// share a tracker between a location feed and a clock must serialize access.
#[derive(Debug)]
pub struct Tracker {
    state: Option<SessionState>,
    last_known: Option<Coordinate>,
    feed: FeedStatus,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            state: None,
            last_known: None,
            feed: FeedStatus::Active,
        }
    }

    pub fn initialize(&mut self, initial: Coordinate) -> Result<&SessionState, TrackerError> {
        initial.validate()?;
        info!("Session initialized at {}, {}", initial.latitude, initial.longitude);
        self.last_known = Some(initial);
        Ok(self.state.insert(SessionState::new(initial)))
    }

    /// Uses the device location when there is one, otherwise the fixed fallback anchor.
    pub fn initialize_or_fallback(&mut self, device_location: Option<Coordinate>) -> Result<&SessionState, TrackerError> {
        match device_location {
            Some(location) => self.initialize(location),
            None => {
                debug!("No device location, using fallback anchor");
                self.initialize(FALLBACK_COORDINATE)
            }
        }
    }

    /// Starts a new session anchored at the last known position.
    pub fn reset(&mut self) -> Result<&SessionState, TrackerError> {
        let anchor = self.last_known.ok_or(TrackerError::UnavailableLocation)?;
        let state = self.state.as_mut().ok_or(TrackerError::UnavailableLocation)?;
        *state = SessionState::new(anchor);
        info!("Session reset at {}, {}", anchor.latitude, anchor.longitude);
        Ok(state)
    }

    pub fn handle_position_update(&mut self, sample: &PositionSample) -> Result<SessionUpdateResult, TrackerError> {
        let state = self.state.as_mut().ok_or(TrackerError::UnavailableLocation)?;

        if self.feed == FeedStatus::Inactive {
            warn!("Dropping sample, location feed is inactive");
            return Err(TrackerError::FeedInactive);
        }

        if let Err(err) = sample.validate() {
            warn!("Rejected sample: {err}");
            return Err(err);
        }

        self.last_known = Some(sample.coordinate);

        let distance = state.last_recorded_coordinate.distance_to(&sample.coordinate);
        debug!("Sample is {:.2} m from anchor", distance);

        let mut waypoint = None;
        let mut session_reset = false;

        if distance > MOVEMENT_THRESHOLD_M {
            state.cumulative_distance_m += distance;
            let recorded = Waypoint::new(sample.coordinate, distance, state.cumulative_distance_m);
            state.waypoints.push(recorded);
            state.last_recorded_coordinate = sample.coordinate;
            waypoint = Some(recorded);

            info!(
                "Waypoint {} recorded, {:.2} m from previous, {:.2} m total",
                state.waypoints.len(),
                distance,
                state.cumulative_distance_m
            );

            // The first crossing is the fix settling, restart the session from here.
            // The reported waypoint becomes the origin of the new session.
            if !state.has_first_waypoint {
                *state = SessionState::new(sample.coordinate);
                state.has_first_waypoint = true;
                session_reset = true;
                waypoint = Some(Waypoint::new(sample.coordinate, distance, state.cumulative_distance_m));
                info!("First waypoint of the session, counters restarted");
            }
        }

        // Hold the last good speed when the device reports none.
        if let Some(speed) = sample.speed_kmh() {
            state.current_speed_kmh = speed;
        }

        Ok(SessionUpdateResult {
            snapshot: state.snapshot(),
            waypoint_created: waypoint.is_some(),
            waypoint,
            session_reset,
        })
    }

    pub fn tick(&mut self) -> Result<u64, TrackerError> {
        let state = self.state.as_mut().ok_or(TrackerError::UnavailableLocation)?;
        state.elapsed_seconds += 1;
        Ok(state.elapsed_seconds)
    }

    pub fn set_feed_status(&mut self, feed: FeedStatus) {
        if self.feed != feed {
            info!("Location feed is now {:?}", feed);
        }
        self.feed = feed;
    }

    pub fn feed_status(&self) -> FeedStatus {
        self.feed
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, TrackerError> {
        self.state
            .as_ref()
            .map(SessionState::snapshot)
            .ok_or(TrackerError::UnavailableLocation)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        self.state.as_ref().map(|state| state.waypoints.as_slice()).unwrap_or_default()
    }

    pub fn last_known_coordinate(&self) -> Option<Coordinate> {
        self.last_known
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::display::format_elapsed;

    fn sample(latitude: f64, longitude: f64, speed: f64) -> PositionSample {
        PositionSample::new(Coordinate::new(latitude, longitude), speed, Utc::now())
    }

    fn tracker_at(latitude: f64, longitude: f64) -> Tracker {
        let mut tracker = Tracker::new();
        tracker.initialize(Coordinate::new(latitude, longitude)).unwrap();
        tracker
    }

    #[test]
    fn jitter_below_threshold_is_ignored() {
        let mut tracker = tracker_at(0.0, 0.0);

        // All within ~45 m of the origin
        for longitude in [0.0001, -0.0002, 0.0004, 0.0, -0.0004] {
            let result = tracker.handle_position_update(&sample(0.0, longitude, 0.0)).unwrap();
            assert!(!result.waypoint_created);
            assert!(result.waypoint.is_none());
            assert_eq!(result.snapshot.cumulative_distance_m, 0.0);
        }

        assert!(tracker.waypoints().is_empty());
        assert_eq!(tracker.state().unwrap().last_recorded_coordinate, Coordinate::new(0.0, 0.0));
    }

    #[test]
    fn first_crossing_restarts_session() {
        let mut tracker = tracker_at(0.0, 0.0);
        tracker.tick().unwrap();
        tracker.tick().unwrap();

        let result = tracker.handle_position_update(&sample(0.0, 0.00047, 0.0)).unwrap();

        assert!(result.waypoint_created);
        assert!(result.session_reset);
        let waypoint = result.waypoint.unwrap();
        assert_eq!(waypoint.coordinate, Coordinate::new(0.0, 0.00047));
        assert!(waypoint.distance_from_previous_m > MOVEMENT_THRESHOLD_M);
        assert_eq!(waypoint.cumulative_distance_m, result.snapshot.cumulative_distance_m);
        assert_eq!(waypoint.cumulative_distance_m, 0.0);

        let state = tracker.state().unwrap();
        assert_eq!(state.cumulative_distance_m, 0.0);
        assert!(state.waypoints.is_empty());
        assert_eq!(state.elapsed_seconds, 0);
        assert!(state.has_first_waypoint);
        assert_eq!(state.initial_coordinate, Coordinate::new(0.0, 0.00047));
        assert_eq!(state.last_recorded_coordinate, Coordinate::new(0.0, 0.00047));
    }

    #[test]
    fn walk_east_scenario() {
        let mut tracker = tracker_at(0.0, 0.0);
        let a = Coordinate::new(0.0, 0.00047);
        let b = Coordinate::new(0.0, 0.00094);

        let result = tracker.handle_position_update(&sample(a.latitude, a.longitude, 1.0)).unwrap();
        assert!(result.waypoint_created);
        assert!(result.session_reset);
        assert_eq!(result.snapshot.cumulative_distance_m, 0.0);

        let result = tracker.handle_position_update(&sample(b.latitude, b.longitude, 1.0)).unwrap();
        let expected = a.distance_to(&b);
        assert!(result.waypoint_created);
        assert!(!result.session_reset);
        assert_eq!(result.snapshot.cumulative_distance_m, expected);
        assert!((expected - 52.26).abs() < 0.1);
        assert_eq!(tracker.waypoints().len(), 1);
        assert_eq!(tracker.waypoints()[0].cumulative_distance_m, expected);
        assert_eq!(tracker.waypoints()[0].distance_from_previous_m, expected);

        let result = tracker.handle_position_update(&sample(b.latitude, b.longitude, 1.0)).unwrap();
        assert!(!result.waypoint_created);
        assert_eq!(result.snapshot.cumulative_distance_m, expected);
        assert_eq!(tracker.waypoints().len(), 1);
    }

    #[test]
    fn distance_accumulates_after_settling() {
        let mut tracker = tracker_at(0.0, 0.0);
        tracker.handle_position_update(&sample(0.0, 0.001, 0.0)).unwrap();

        let mut previous = 0.0;
        for step in 2..6 {
            let result = tracker
                .handle_position_update(&sample(0.0, 0.001 * step as f64, 0.0))
                .unwrap();
            assert!(result.waypoint_created);
            assert!(!result.session_reset);
            assert!(result.snapshot.cumulative_distance_m > previous);
            previous = result.snapshot.cumulative_distance_m;
        }

        assert_eq!(tracker.waypoints().len(), 4);
        let last = tracker.waypoints().last().unwrap();
        assert_eq!(last.cumulative_distance_m, previous);
    }

    #[test]
    fn reset_clears_everything() {
        let mut tracker = tracker_at(0.0, 0.0);
        tracker.handle_position_update(&sample(0.0, 0.001, 5.0)).unwrap();
        tracker.handle_position_update(&sample(0.0, 0.002, 5.0)).unwrap();
        for _ in 0..10 {
            tracker.tick().unwrap();
        }
        assert!(tracker.snapshot().unwrap().cumulative_distance_m > 0.0);

        let state = tracker.reset().unwrap();
        assert_eq!(state.elapsed_seconds, 0);
        assert!(state.waypoints.is_empty());
        assert_eq!(state.cumulative_distance_m, 0.0);
        assert_eq!(state.current_speed_kmh, 0.0);
        assert!(!state.has_first_waypoint);

        // Resetting twice is the same as resetting once
        let again = tracker.reset().unwrap().clone();
        assert_eq!(again, SessionState::new(Coordinate::new(0.0, 0.002)));
    }

    #[test]
    fn reset_anchors_at_last_known_position() {
        let mut tracker = tracker_at(0.0, 0.0);
        // Below threshold, moves the last known position but not the anchor
        tracker.handle_position_update(&sample(0.0, 0.0003, 0.0)).unwrap();
        assert_eq!(tracker.state().unwrap().last_recorded_coordinate, Coordinate::new(0.0, 0.0));

        let state = tracker.reset().unwrap();
        assert_eq!(state.initial_coordinate, Coordinate::new(0.0, 0.0003));
        assert_eq!(state.last_recorded_coordinate, Coordinate::new(0.0, 0.0003));
    }

    #[test]
    fn manual_reset_rearms_settling() {
        let mut tracker = tracker_at(0.0, 0.0);
        tracker.handle_position_update(&sample(0.0, 0.001, 0.0)).unwrap();
        tracker.reset().unwrap();

        let result = tracker.handle_position_update(&sample(0.0, 0.002, 0.0)).unwrap();
        assert!(result.session_reset);
        assert_eq!(result.snapshot.cumulative_distance_m, 0.0);
    }

    #[test]
    fn speed_is_sticky() {
        let mut tracker = tracker_at(0.0, 0.0);

        let result = tracker.handle_position_update(&sample(0.0, 0.0, 10.0)).unwrap();
        assert_eq!(result.snapshot.current_speed_kmh, 36.0);

        let result = tracker.handle_position_update(&sample(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(result.snapshot.current_speed_kmh, 36.0);

        let result = tracker.handle_position_update(&sample(0.0, 0.0, -1.0)).unwrap();
        assert_eq!(result.snapshot.current_speed_kmh, 36.0);
        assert_eq!(result.snapshot.speed_label(), "36 Km/h");
    }

    #[test]
    fn unusable_speed_still_records_movement() {
        let mut tracker = tracker_at(0.0, 0.0);
        tracker.handle_position_update(&sample(0.0, 0.001, 5.0)).unwrap();

        let result = tracker.handle_position_update(&sample(0.0, 0.002, f64::NAN)).unwrap();
        assert!(result.waypoint_created);
        assert!((result.snapshot.cumulative_distance_m - 111.19).abs() < 0.1);
        assert_eq!(result.snapshot.current_speed_kmh, 18.0);

        let result = tracker.handle_position_update(&sample(0.0, 0.003, f64::INFINITY)).unwrap();
        assert!(result.waypoint_created);
        assert_eq!(result.snapshot.current_speed_kmh, 18.0);
        assert_eq!(tracker.waypoints().len(), 2);
        assert_eq!(tracker.last_known_coordinate(), Some(Coordinate::new(0.0, 0.003)));
    }

    #[test]
    fn threshold_is_exclusive() {
        let origin = Coordinate::new(0.0, 0.0);
        let inside = Coordinate::new(0.0, 0.000449);
        let outside = Coordinate::new(0.0, 0.000450);
        assert!(origin.distance_to(&inside) < MOVEMENT_THRESHOLD_M);
        assert!(origin.distance_to(&outside) > MOVEMENT_THRESHOLD_M);

        let mut tracker = tracker_at(0.0, 0.0);
        let result = tracker.handle_position_update(&sample(0.0, inside.longitude, 0.0)).unwrap();
        assert!(!result.waypoint_created);
        assert!(!result.session_reset);
        assert_eq!(tracker.state().unwrap().last_recorded_coordinate, origin);

        let result = tracker.handle_position_update(&sample(0.0, outside.longitude, 0.0)).unwrap();
        assert!(result.waypoint_created);
        assert!(result.session_reset);
        assert_eq!(tracker.state().unwrap().last_recorded_coordinate, outside);
    }

    #[test]
    fn speed_survives_settling_reset() {
        let mut tracker = tracker_at(0.0, 0.0);
        let result = tracker.handle_position_update(&sample(0.0, 0.001, 2.5)).unwrap();
        assert!(result.session_reset);
        assert_eq!(result.snapshot.current_speed_kmh, 9.0);
    }

    #[test]
    fn ticks_count_seconds() {
        let mut tracker = tracker_at(0.0, 0.0);
        tracker.tick().unwrap();
        tracker.reset().unwrap();

        let mut elapsed = 0;
        for _ in 0..60 {
            elapsed = tracker.tick().unwrap();
        }
        assert_eq!(elapsed, 60);
        assert_eq!(tracker.snapshot().unwrap().elapsed_seconds, 60);
        assert_eq!(format_elapsed(elapsed), "01:00");
        assert_eq!(tracker.snapshot().unwrap().cumulative_distance_m, 0.0);
    }

    #[test]
    fn invalid_sample_leaves_state_untouched() {
        let mut tracker = tracker_at(0.0, 0.0);
        tracker.handle_position_update(&sample(0.0, 0.001, 3.0)).unwrap();
        tracker.handle_position_update(&sample(0.0, 0.002, 3.0)).unwrap();
        let before = tracker.state().unwrap().clone();

        for bad in [sample(f64::NAN, 0.0, 3.0), sample(95.0, 0.0, 3.0), sample(0.0, 200.0, 3.0)] {
            let err = tracker.handle_position_update(&bad).unwrap_err();
            assert!(matches!(err, TrackerError::InvalidSample { .. }));
        }

        assert_eq!(tracker.state().unwrap(), &before);
        assert_eq!(tracker.last_known_coordinate(), Some(Coordinate::new(0.0, 0.002)));
    }

    #[test]
    fn uninitialized_tracker_has_no_anchor() {
        let mut tracker = Tracker::new();
        assert!(!tracker.is_initialized());
        assert_eq!(
            tracker.handle_position_update(&sample(0.0, 0.0, 0.0)).unwrap_err(),
            TrackerError::UnavailableLocation
        );
        assert_eq!(tracker.tick().unwrap_err(), TrackerError::UnavailableLocation);
        assert_eq!(tracker.reset().unwrap_err(), TrackerError::UnavailableLocation);
        assert!(tracker.waypoints().is_empty());
    }

    #[test]
    fn fallback_anchor() {
        let mut tracker = Tracker::new();
        let state = tracker.initialize_or_fallback(None).unwrap();
        assert_eq!(state.initial_coordinate, FALLBACK_COORDINATE);

        let state = tracker.initialize_or_fallback(Some(Coordinate::new(1.0, 2.0))).unwrap();
        assert_eq!(state.initial_coordinate, Coordinate::new(1.0, 2.0));

        assert!(tracker.initialize(Coordinate::new(100.0, 0.0)).is_err());
    }

    #[test]
    fn inactive_feed_freezes_state() {
        let mut tracker = tracker_at(0.0, 0.0);
        tracker.set_feed_status(FeedStatus::Inactive);
        assert_eq!(tracker.feed_status(), FeedStatus::Inactive);

        let err = tracker.handle_position_update(&sample(0.0, 0.01, 4.0)).unwrap_err();
        assert_eq!(err, TrackerError::FeedInactive);
        assert_eq!(tracker.snapshot().unwrap().current_speed_kmh, 0.0);
        assert_eq!(tracker.last_known_coordinate(), Some(Coordinate::new(0.0, 0.0)));

        tracker.set_feed_status(FeedStatus::Active);
        let result = tracker.handle_position_update(&sample(0.0, 0.01, 4.0)).unwrap();
        assert!(result.waypoint_created);
    }
}
