use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use session_tracker_lib::{
    display::format_elapsed, Coordinate, LiveSession, PositionSample, SessionClock, SessionEvent,
    SessionSnapshot, SessionUpdateResult, Tracker, TrackerError, ViewSettings, Waypoint,
};
use tokio::{sync::broadcast::error::RecvError, time::Instant};
use tracing::{debug, info, trace, warn};

#[derive(Debug, Serialize)]
pub struct ReplaySummary {
    pub snapshot: SessionSnapshot,
    pub waypoints: Vec<Waypoint>,
    pub samples: usize,
    pub rejected: usize,
    pub settling_resets: usize,
    pub view: ViewSettings,
}

impl ReplaySummary {
    pub fn log(&self) {
        info!(
            "Replayed {} samples ({} rejected): {}, {}, {} with {} waypoints",
            self.samples,
            self.rejected,
            self.snapshot.distance_label(),
            self.snapshot.speed_label(),
            self.snapshot.elapsed_label(),
            self.waypoints.len()
        );
    }
}

#[derive(Default)]
struct Counters {
    rejected: usize,
    settling_resets: usize,
}

impl Counters {
    fn record(&mut self, sample: &PositionSample, result: Result<SessionUpdateResult, TrackerError>) {
        match result {
            Ok(result) => {
                if let Some(waypoint) = result.waypoint {
                    info!("Waypoint at {} ({}), {}", waypoint.title(), waypoint.subtitle(), result.snapshot.distance_label());
                }
                if result.session_reset {
                    self.settling_resets += 1;
                }
            }
            Err(err) => {
                warn!("Skipping sample at {}: {err}", sample.timestamp);
                self.rejected += 1;
            }
        }
    }
}

/// Replays the samples as fast as possible. The clock is stepped by hand, one tick for every
/// whole second of track time since the current clock period started.
pub fn replay_stepped(samples: &[PositionSample], anchor: Coordinate, view: ViewSettings) -> Result<ReplaySummary> {
    let Some(first) = samples.first() else {
        bail!("Track has no points");
    };

    let mut tracker = Tracker::new();
    tracker.initialize(anchor)?;

    let mut clock = SessionClock::new();
    let mut token = clock.start();
    let mut period_start = first.timestamp;
    let mut ticks_in_period = 0;
    let mut counters = Counters::default();

    for sample in samples {
        let due = (sample.timestamp - period_start).num_seconds().max(0) as u64;
        while ticks_in_period < due {
            clock.deliver(token, &mut tracker)?;
            ticks_in_period += 1;
        }

        let result = tracker.handle_position_update(sample);
        if matches!(result, Ok(SessionUpdateResult { session_reset: true, .. })) {
            token = clock.restart();
            period_start = sample.timestamp;
            ticks_in_period = 0;
        }
        counters.record(sample, result);
    }

    clock.stop();

    Ok(ReplaySummary {
        snapshot: tracker.snapshot()?,
        waypoints: tracker.waypoints().to_vec(),
        samples: samples.len(),
        rejected: counters.rejected,
        settling_resets: counters.settling_resets,
        view,
    })
}

/// Feeds the samples to a live session at the pace of their timestamps, `speedup` times faster.
pub async fn replay_realtime(
    samples: &[PositionSample],
    anchor: Coordinate,
    view: ViewSettings,
    speedup: f64,
) -> Result<ReplaySummary> {
    let Some(first) = samples.first() else {
        bail!("Track has no points");
    };
    if !(speedup.is_finite() && speedup > 0.0) {
        bail!("Speedup must be positive, got {speedup}");
    }

    // Delay of every sample after the replay starts
    let schedule = samples
        .iter()
        .map(|sample| {
            let offset = (sample.timestamp - first.timestamp).to_std().unwrap_or_default();
            Duration::try_from_secs_f64(offset.as_secs_f64() / speedup)
                .with_context(|| format!("Speedup {speedup} is too small to pace the track"))
        })
        .collect::<Result<Vec<_>>>()?;

    let session = LiveSession::start(Some(anchor), view)?;

    let mut events = session.subscribe();
    let reporter = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::Tick { elapsed_seconds }) => debug!("Elapsed {}", format_elapsed(elapsed_seconds)),
                Ok(event) => trace!("{:?}", event),
                Err(RecvError::Lagged(missed)) => warn!("Reporter missed {} events", missed),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let started = Instant::now();
    let mut counters = Counters::default();

    for (sample, delay) in samples.iter().zip(schedule) {
        let Some(deadline) = started.checked_add(delay) else {
            session.shutdown().await;
            reporter.abort();
            bail!("Speedup {speedup} is too small to pace the track");
        };
        tokio::time::sleep_until(deadline).await;

        let result = session.push_sample(*sample).await;
        counters.record(sample, result);
    }

    session.shutdown().await;
    reporter.abort();

    Ok(ReplaySummary {
        snapshot: session.snapshot().await?,
        waypoints: session.waypoints().await,
        samples: samples.len(),
        rejected: counters.rejected,
        settling_resets: counters.settling_resets,
        view: session.view().await,
    })
}
