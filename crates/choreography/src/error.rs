//! Choreography error types.

use bus::{BusError, HandlerError};
use inventory::InventoryError;
use orders::OrderError;
use thiserror::Error;

/// Errors that can occur while reacting to events or executing commands.
#[derive(Debug, Error)]
pub enum ChoreographyError {
    /// Order state machine or repository error.
    #[error("order error: {0}")]
    Order(#[from] OrderError),

    /// Reservation engine or inventory store error.
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Event bus error.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// An inbound payload did not match its topic's shape.
    #[error("malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl ChoreographyError {
    /// Returns true if retrying the operation could help.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            ChoreographyError::Order(err) => err.is_infrastructure(),
            ChoreographyError::Inventory(err) => err.is_infrastructure(),
            ChoreographyError::Bus(_) => true,
            ChoreographyError::Payload(_) => false,
        }
    }
}

impl From<ChoreographyError> for HandlerError {
    fn from(err: ChoreographyError) -> Self {
        if err.is_infrastructure() {
            HandlerError::Infrastructure(err.to_string())
        } else {
            HandlerError::Rejected(err.to_string())
        }
    }
}

/// Convenience type alias for choreography results.
pub type Result<T> = std::result::Result<T, ChoreographyError>;
