//! Bus error types.

use thiserror::Error;

/// Errors that can occur publishing to or consuming from the bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// A payload could not be serialized for the wire.
    #[error("failed to encode payload for '{topic}': {source}")]
    Encode {
        topic: String,
        source: serde_json::Error,
    },

    /// The bus is unreachable or its channels are gone.
    #[error("bus unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for bus results.
pub type Result<T> = std::result::Result<T, BusError>;
