//! Inventory error types.

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during inventory operations.
///
/// All three locking strategies surface the same kinds, so callers never
/// need strategy-specific handling.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    /// No inventory record exists for the product.
    #[error("product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Not enough available stock to satisfy the request.
    #[error("insufficient stock for {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// A competing writer won the race (lock wait exceeded or retries exhausted).
    #[error("concurrent update lost for {product_id}: {detail}")]
    ConcurrencyConflict {
        product_id: ProductId,
        detail: String,
    },

    /// The backing store is unreachable or misbehaving.
    #[error("inventory store failure: {0}")]
    Infrastructure(String),
}

impl InventoryError {
    /// Returns true if the error indicates a transient infrastructure
    /// problem rather than a business outcome.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, InventoryError::Infrastructure(_))
    }
}

/// Convenience type alias for inventory results.
pub type Result<T> = std::result::Result<T, InventoryError>;
