//! Process-local lock table for the application-level strategy.

use std::collections::HashMap;
use std::sync::Arc;

use common::ProductId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-product lock table owned by the engine.
///
/// Entries are created on first use and pruned once no caller holds them,
/// so the table stays bounded by the number of products under contention.
/// Serializes only callers that share this map: a second process (or a
/// second engine instance) writing to the same store is not serialized.
#[derive(Clone, Default)]
pub struct ProductLockMap {
    inner: Arc<Mutex<HashMap<ProductId, Arc<Mutex<()>>>>>,
}

impl ProductLockMap {
    /// Creates an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a product, waiting until it is free.
    ///
    /// The returned guard keeps the entry alive; unheld entries are pruned
    /// on the next acquisition.
    pub async fn acquire(&self, product_id: &ProductId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // An entry referenced only by the map has no holder left.
            map.retain(|_, l| Arc::strong_count(l) > 1);
            map.entry(product_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Returns true if no entries are live.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
