use tracing::{debug, trace};

use crate::{Tracker, TrackerError};

/// Identifies one clock period. Ticks are only accepted with the token of the current period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockToken(u64);

/// Gate between an external once-per-second scheduler and `Tracker::tick`.
///
/// The scheduler receives a token from `start` or `restart` and hands it back with every tick.
/// Stopping or restarting bumps the generation, so a tick that was already scheduled
/// for an earlier period is dropped instead of reaching the tracker.
#[derive(Debug, Default)]
pub struct SessionClock {
    generation: u64,
    running: bool,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) -> ClockToken {
        self.generation += 1;
        self.running = true;
        debug!("Clock started, generation {}", self.generation);
        ClockToken(self.generation)
    }

    pub fn stop(&mut self) {
        self.generation += 1;
        self.running = false;
        debug!("Clock stopped");
    }

    pub fn restart(&mut self) -> ClockToken {
        self.stop();
        self.start()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_current(&self, token: ClockToken) -> bool {
        self.running && token.0 == self.generation
    }

    /// Ticks the tracker if `token` belongs to the running period. `Ok(None)` means the tick was stale.
    pub fn deliver(&self, token: ClockToken, tracker: &mut Tracker) -> Result<Option<u64>, TrackerError> {
        if !self.is_current(token) {
            trace!("Dropping stale tick from generation {}", token.0);
            return Ok(None);
        }
        tracker.tick().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Coordinate;

    fn tracker() -> Tracker {
        let mut tracker = Tracker::new();
        tracker.initialize(Coordinate::new(0.0, 0.0)).unwrap();
        tracker
    }

    #[test]
    fn ticks_while_running() {
        let mut tracker = tracker();
        let mut clock = SessionClock::new();
        assert!(!clock.is_running());

        let token = clock.start();
        assert_eq!(clock.deliver(token, &mut tracker).unwrap(), Some(1));
        assert_eq!(clock.deliver(token, &mut tracker).unwrap(), Some(2));
    }

    #[test]
    fn restart_invalidates_pending_tick() {
        let mut tracker = tracker();
        let mut clock = SessionClock::new();

        let old = clock.start();
        clock.deliver(old, &mut tracker).unwrap();

        tracker.reset().unwrap();
        let new = clock.restart();
        assert_ne!(old, new);

        // A tick scheduled before the restart arrives late
        assert_eq!(clock.deliver(old, &mut tracker).unwrap(), None);
        assert_eq!(tracker.snapshot().unwrap().elapsed_seconds, 0);

        assert_eq!(clock.deliver(new, &mut tracker).unwrap(), Some(1));
    }

    #[test]
    fn stopped_clock_drops_ticks() {
        let mut tracker = tracker();
        let mut clock = SessionClock::new();

        let token = clock.start();
        clock.stop();
        assert_eq!(clock.deliver(token, &mut tracker).unwrap(), None);
        assert_eq!(tracker.snapshot().unwrap().elapsed_seconds, 0);

        let token = clock.start();
        assert!(clock.is_current(token));
        assert_eq!(clock.deliver(token, &mut tracker).unwrap(), Some(1));
    }

    #[test]
    fn uninitialized_tracker_is_reported() {
        let mut tracker = Tracker::new();
        let mut clock = SessionClock::new();
        let token = clock.start();
        assert_eq!(clock.deliver(token, &mut tracker), Err(TrackerError::UnavailableLocation));
    }
}
