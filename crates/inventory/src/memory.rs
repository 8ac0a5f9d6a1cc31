//! In-memory inventory store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::{Mutex, RwLock};

use crate::error::InventoryError;
use crate::record::{InventoryRecord, Version};
use crate::store::{InventoryStore, ProductLock};
use crate::Result;

/// In-memory inventory store.
///
/// Records live under a read-write lock; per-product row locks are plain
/// async mutexes created lazily the first time a product is locked. Provides
/// the same interface a database-backed store would, including an atomic
/// conditional write.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    records: Arc<RwLock<HashMap<ProductId, InventoryRecord>>>,
    row_locks: Arc<Mutex<HashMap<ProductId, Arc<Mutex<()>>>>>,
}

impl InMemoryInventoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns all records, for inspection in tests and the gateway.
    pub async fn all_records(&self) -> Vec<InventoryRecord> {
        self.records.read().await.values().cloned().collect()
    }

    async fn row_lock(&self, product_id: &ProductId) -> Arc<Mutex<()>> {
        let mut locks = self.row_locks.lock().await;
        locks
            .entry(product_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn find(&self, product_id: &ProductId) -> Result<Option<InventoryRecord>> {
        Ok(self.records.read().await.get(product_id).cloned())
    }

    async fn insert(&self, record: InventoryRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.product_id().clone(), record);
        Ok(())
    }

    async fn put(&self, record: InventoryRecord) -> Result<InventoryRecord> {
        let mut records = self.records.write().await;
        if !records.contains_key(record.product_id()) {
            return Err(InventoryError::ProductNotFound {
                product_id: record.product_id().clone(),
            });
        }
        records.insert(record.product_id().clone(), record.clone());
        Ok(record)
    }

    async fn put_if_version(
        &self,
        record: InventoryRecord,
        expected: Version,
    ) -> Result<Option<InventoryRecord>> {
        let mut records = self.records.write().await;
        let current = records.get(record.product_id()).ok_or_else(|| {
            InventoryError::ProductNotFound {
                product_id: record.product_id().clone(),
            }
        })?;

        if current.version() != expected {
            return Ok(None);
        }

        records.insert(record.product_id().clone(), record.clone());
        Ok(Some(record))
    }

    async fn lock(&self, product_id: &ProductId, wait: Duration) -> Result<ProductLock> {
        let lock = self.row_lock(product_id).await;

        match tokio::time::timeout(wait, lock.lock_owned()).await {
            Ok(guard) => Ok(ProductLock::new(guard)),
            Err(_) => Err(InventoryError::ConcurrencyConflict {
                product_id: product_id.clone(),
                detail: format!("row lock wait exceeded {wait:?}"),
            }),
        }
    }
}
