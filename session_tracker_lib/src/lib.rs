//! Distance, speed and elapsed time for a live location tracking session.
//!
//! [`Tracker`] consumes position samples and decides when a waypoint is recorded,
//! [`SessionClock`] gates the once-per-second ticks that advance elapsed time.
//! With the `runtime` feature, [`LiveSession`] drives both from a tokio runtime.

mod clock;
mod coordinate;
pub mod display;
mod error;
mod position_sample;
mod session;
mod tracker;
mod view;
mod waypoint;

#[cfg(feature = "runtime")]
mod live_session;

pub use clock::{ClockToken, SessionClock};
pub use coordinate::{Coordinate, FALLBACK_COORDINATE};
pub use error::TrackerError;
pub use position_sample::{PositionSample, KMH_PER_MPS};
pub use session::{FeedStatus, SessionSnapshot, SessionState, SessionUpdateResult};
pub use tracker::{Tracker, MOVEMENT_THRESHOLD_M};
pub use view::{MapStyle, ViewSettings, DEFAULT_CAMERA_ALTITUDE_M};
pub use waypoint::Waypoint;

#[cfg(feature = "runtime")]
pub use live_session::{LiveSession, SessionEvent, TICK_PERIOD};
