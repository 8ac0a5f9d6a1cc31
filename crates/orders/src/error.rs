//! Order error types.

use common::OrderId;
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error)]
pub enum OrderError {
    /// The requested transition is not allowed from the current status.
    #[error("invalid order status: cannot {action} while {current}")]
    InvalidStatus {
        current: OrderStatus,
        action: &'static str,
    },

    /// An order item or the pricing invariant failed validation.
    #[error("invalid order item: {0}")]
    InvalidItem(String),

    /// No order exists with the given ID.
    #[error("order not found: {order_id}")]
    NotFound { order_id: OrderId },

    /// The order store is unreachable or misbehaving.
    #[error("order store failure: {0}")]
    Infrastructure(String),
}

impl OrderError {
    /// Returns true if the error indicates a transient infrastructure
    /// problem rather than a business outcome.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, OrderError::Infrastructure(_))
    }
}

/// Convenience type alias for order results.
pub type Result<T> = std::result::Result<T, OrderError>;
