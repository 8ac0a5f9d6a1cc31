//! Tracking error types.

use thiserror::Error;

/// Errors that can occur in the tracking log.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// A delivery arrived on a topic outside the known event set.
    #[error("unknown event topic: {0}")]
    UnknownTopic(String),

    /// A payload did not carry the fields the log requires.
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),

    /// The tracking store is unreachable or misbehaving.
    #[error("tracking store failure: {0}")]
    Infrastructure(String),
}

/// Convenience type alias for tracking results.
pub type Result<T> = std::result::Result<T, TrackingError>;
