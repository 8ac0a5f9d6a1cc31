//! Narrow persistence contract consumed by the reservation engine.

use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::OwnedMutexGuard;

use crate::record::{InventoryRecord, Version};
use crate::Result;

/// An exclusive per-product row lock held in the store.
///
/// The lock is released when the guard is dropped. While it is held, no
/// other caller can acquire the same product's lock, so an unconditional
/// [`InventoryStore::put`] is safe.
#[derive(Debug)]
pub struct ProductLock {
    _guard: OwnedMutexGuard<()>,
}

impl ProductLock {
    pub(crate) fn new(guard: OwnedMutexGuard<()>) -> Self {
        Self { _guard: guard }
    }
}

/// Store interface for inventory records.
///
/// Implementations must make `put_if_version` atomic with respect to
/// concurrent writers; the optimistic strategy's correctness depends on
/// nothing else.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Looks up a record by product ID.
    async fn find(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>>;

    /// Inserts or replaces a record. Intended for seeding stock.
    async fn insert(&self, record: InventoryRecord) -> Result<()>;

    /// Writes a record unconditionally.
    ///
    /// Only valid while holding the product's [`ProductLock`], or under a
    /// lock the caller owns itself (application-level strategy).
    async fn put(&self, record: InventoryRecord) -> Result<InventoryRecord>;

    /// Writes a record only if the stored version still equals `expected`.
    ///
    /// Returns `None` when a competing writer got there first.
    async fn put_if_version(
        &self,
        record: InventoryRecord,
        expected: Version,
    ) -> Result<Option<InventoryRecord>>;

    /// Acquires the product's exclusive row lock, waiting at most `wait`.
    ///
    /// A lock wait that exceeds `wait` fails with
    /// [`InventoryError::ConcurrencyConflict`](crate::InventoryError::ConcurrencyConflict).
    async fn lock(&self, product_id: &ProductId, wait: Duration) -> Result<ProductLock>;
}
