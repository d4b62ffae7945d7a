use std::{sync::Arc, time::Duration};

use tokio::{
    runtime::Handle,
    sync::{broadcast, Mutex},
    time::{interval_at, Instant},
};
use tracing::{debug, error, info};

use crate::{
    ClockToken, Coordinate, FeedStatus, PositionSample, SessionClock, SessionSnapshot,
    SessionUpdateResult, Tracker, TrackerError, ViewSettings, Waypoint,
};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);
const EVENT_CAPACITY: usize = 100;

/// Published to presentation collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Updated(SessionUpdateResult),
    Tick { elapsed_seconds: u64 },
    Reset(SessionSnapshot),
    FeedChanged(FeedStatus),
    ViewChanged(ViewSettings),
}

struct LiveState {
    tracker: Tracker,
    clock: SessionClock,
    view: ViewSettings,
}

/// Tracker and clock driven by the tokio runtime.
///
/// Position updates, ticks and resets all take the same lock, and the clock generation is
/// checked under that lock, so a reset can never be followed by a tick of the old period.
#[derive(Clone)]
pub struct LiveSession {
    state: Arc<Mutex<LiveState>>,
    tx: broadcast::Sender<SessionEvent>,
    runtime: Handle,
}

impl LiveSession {
    /// Fails with [`TrackerError::RuntimeUnavailable`] outside a tokio runtime, the clock task
    /// needs one to run on.
    pub fn start(device_location: Option<Coordinate>, view: ViewSettings) -> Result<Self, TrackerError> {
        let runtime = Handle::try_current().map_err(|_| TrackerError::RuntimeUnavailable)?;

        let mut tracker = Tracker::new();
        tracker.initialize_or_fallback(device_location)?;

        let mut clock = SessionClock::new();
        let token = clock.start();

        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);

        let session = Self {
            state: Arc::new(Mutex::new(LiveState { tracker, clock, view })),
            tx,
            runtime,
        };
        session.spawn_clock(token);

        info!("Live session started");
        Ok(session)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub async fn push_sample(&self, sample: PositionSample) -> Result<SessionUpdateResult, TrackerError> {
        let mut state = self.state.lock().await;
        let result = state.tracker.handle_position_update(&sample)?;

        if result.session_reset {
            let token = state.clock.restart();
            self.spawn_clock(token);
        }

        self.publish(SessionEvent::Updated(result));
        Ok(result)
    }

    /// User requested reset: new session at the last known position and a fresh clock period.
    pub async fn reset(&self) -> Result<SessionSnapshot, TrackerError> {
        let mut state = self.state.lock().await;
        let snapshot = state.tracker.reset()?.snapshot();
        let token = state.clock.restart();
        self.spawn_clock(token);

        self.publish(SessionEvent::Reset(snapshot));
        Ok(snapshot)
    }

    pub async fn set_feed_status(&self, feed: FeedStatus) {
        self.state.lock().await.tracker.set_feed_status(feed);
        self.publish(SessionEvent::FeedChanged(feed));
    }

    pub async fn set_view(&self, view: ViewSettings) {
        self.state.lock().await.view = view;
        self.publish(SessionEvent::ViewChanged(view));
    }

    pub async fn view(&self) -> ViewSettings {
        self.state.lock().await.view
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, TrackerError> {
        self.state.lock().await.tracker.snapshot()
    }

    pub async fn waypoints(&self) -> Vec<Waypoint> {
        self.state.lock().await.tracker.waypoints().to_vec()
    }

    pub async fn is_clock_running(&self) -> bool {
        self.state.lock().await.clock.is_running()
    }

    /// Stops the clock. The tracker keeps its state and can still be read.
    pub async fn shutdown(&self) {
        self.state.lock().await.clock.stop();
        info!("Live session stopped");
    }

    fn spawn_clock(&self, token: ClockToken) {
        self.runtime.spawn(clock_task(self.state.clone(), self.tx.clone(), token));
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}

async fn clock_task(state: Arc<Mutex<LiveState>>, tx: broadcast::Sender<SessionEvent>, token: ClockToken) {
    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);

    loop {
        interval.tick().await;

        let mut guard = state.lock().await;
        let LiveState { tracker, clock, .. } = &mut *guard;

        match clock.deliver(token, tracker) {
            Ok(Some(elapsed_seconds)) => {
                let _ = tx.send(SessionEvent::Tick { elapsed_seconds });
            }
            Ok(None) => break,
            Err(err) => {
                error!("Clock could not tick: {err}");
                break;
            }
        }
    }

    debug!("Clock task for {:?} ended", token);
}
