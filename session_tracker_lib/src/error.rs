use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TrackerError {
    #[error("no location anchor, the tracker has not been initialized")]
    UnavailableLocation,
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidSample { latitude: f64, longitude: f64 },
    #[error("no tokio runtime to drive the session clock")]
    RuntimeUnavailable,
    #[error("location feed is inactive")]
    FeedInactive,
}
