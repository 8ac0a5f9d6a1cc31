//! Reservation engine dispatching over the configured locking strategy.

use std::str::FromStr;
use std::time::Duration;

use common::{OrderId, ProductId};

use crate::error::{InventoryError, Result};
use crate::locks::ProductLockMap;
use crate::record::InventoryRecord;
use crate::store::InventoryStore;

/// Concurrency-control strategy for inventory writes.
///
/// Selected once at process start from configuration; all strategies
/// satisfy the same external contract and surface the same error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockingStrategy {
    /// Exclusive per-product row lock held by the store; losers block with
    /// a bounded wait and re-evaluate availability once they acquire it.
    #[default]
    Pessimistic,

    /// Versioned read with an atomic conditional write, retried a bounded
    /// number of times. Never blocks.
    Optimistic,

    /// Engine-owned per-product lock map. Serializes only callers within
    /// this process instance; not linearizable across processes without an
    /// external coordinator.
    Application,
}

impl LockingStrategy {
    /// Returns the strategy name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            LockingStrategy::Pessimistic => "PESSIMISTIC",
            LockingStrategy::Optimistic => "OPTIMISTIC",
            LockingStrategy::Application => "APPLICATION",
        }
    }
}

impl std::fmt::Display for LockingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LockingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PESSIMISTIC" => Ok(LockingStrategy::Pessimistic),
            "OPTIMISTIC" => Ok(LockingStrategy::Optimistic),
            "APPLICATION" => Ok(LockingStrategy::Application),
            other => Err(format!("unknown locking strategy: {other}")),
        }
    }
}

/// Tunables for the locking strategies.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bound on the pessimistic row-lock wait.
    pub lock_wait: Duration,

    /// Bound on optimistic read-compute-write attempts.
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

/// Serializes reserve/release operations against the inventory store.
///
/// The engine exclusively owns record mutation: counters only move through
/// [`ReservationEngine::reserve`] and [`ReservationEngine::release`], each
/// executed under the configured locking discipline.
pub struct ReservationEngine<S: InventoryStore> {
    store: S,
    strategy: LockingStrategy,
    config: EngineConfig,
    app_locks: ProductLockMap,
}

impl<S: InventoryStore> ReservationEngine<S> {
    /// Creates an engine with default tunables.
    pub fn new(store: S, strategy: LockingStrategy) -> Self {
        Self::with_config(store, strategy, EngineConfig::default())
    }

    /// Creates an engine with explicit tunables.
    pub fn with_config(store: S, strategy: LockingStrategy, config: EngineConfig) -> Self {
        Self {
            store,
            strategy,
            config,
            app_locks: ProductLockMap::new(),
        }
    }

    /// Returns the configured strategy.
    pub fn strategy(&self) -> LockingStrategy {
        self.strategy
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserves `quantity` units of a product on behalf of an order.
    ///
    /// Fails with `InsufficientStock` when not enough units are available,
    /// `ProductNotFound` when no record exists, and `ConcurrencyConflict`
    /// when a competing writer wins the race under the configured strategy.
    #[tracing::instrument(skip(self), fields(strategy = %self.strategy))]
    pub async fn reserve(
        &self,
        product_id: &ProductId,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<InventoryRecord> {
        metrics::counter!("inventory_reserve_attempts_total", "strategy" => self.strategy.as_str())
            .increment(1);
        let started = std::time::Instant::now();

        let result = self
            .mutate(product_id, |record| record.reserve(quantity))
            .await;

        metrics::histogram!("inventory_operation_duration_seconds", "strategy" => self.strategy.as_str())
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(record) => {
                tracing::info!(
                    %product_id,
                    quantity,
                    available = record.available(),
                    reserved = record.reserved(),
                    "stock reserved"
                );
            }
            Err(InventoryError::ConcurrencyConflict { detail, .. }) => {
                metrics::counter!("inventory_conflicts_total", "strategy" => self.strategy.as_str())
                    .increment(1);
                tracing::warn!(%product_id, quantity, detail, "reservation lost race");
            }
            Err(err) => {
                tracing::warn!(%product_id, quantity, error = %err, "reservation failed");
            }
        }

        result
    }

    /// Returns `quantity` previously reserved units of a product.
    ///
    /// Always succeeds if the record exists; fails with `ProductNotFound`
    /// otherwise.
    #[tracing::instrument(skip(self), fields(strategy = %self.strategy))]
    pub async fn release(
        &self,
        product_id: &ProductId,
        quantity: u32,
        order_id: OrderId,
    ) -> Result<InventoryRecord> {
        metrics::counter!("inventory_release_total", "strategy" => self.strategy.as_str())
            .increment(1);

        let result = self
            .mutate(product_id, |record| {
                record.release(quantity);
                Ok(())
            })
            .await;

        if let Ok(record) = &result {
            tracing::info!(
                %product_id,
                quantity,
                available = record.available(),
                reserved = record.reserved(),
                "stock released"
            );
        }

        result
    }

    /// Runs a record mutation under the configured locking discipline.
    async fn mutate<F>(&self, product_id: &ProductId, mutation: F) -> Result<InventoryRecord>
    where
        F: Fn(&mut InventoryRecord) -> Result<()>,
    {
        match self.strategy {
            LockingStrategy::Pessimistic => self.mutate_pessimistic(product_id, mutation).await,
            LockingStrategy::Optimistic => self.mutate_optimistic(product_id, mutation).await,
            LockingStrategy::Application => self.mutate_application(product_id, mutation).await,
        }
    }

    /// Read-mutate-write under the store's exclusive row lock.
    async fn mutate_pessimistic<F>(&self, product_id: &ProductId, mutation: F) -> Result<InventoryRecord>
    where
        F: Fn(&mut InventoryRecord) -> Result<()>,
    {
        let _lock = self.store.lock(product_id, self.config.lock_wait).await?;

        let mut record = self.require(product_id).await?;
        mutation(&mut record)?;
        self.store.put(record).await
    }

    /// Versioned read-compute-write cycle with bounded retries.
    async fn mutate_optimistic<F>(&self, product_id: &ProductId, mutation: F) -> Result<InventoryRecord>
    where
        F: Fn(&mut InventoryRecord) -> Result<()>,
    {
        for attempt in 1..=self.config.max_retries {
            let current = self.require(product_id).await?;
            let expected = current.version();

            let mut next = current;
            mutation(&mut next)?;

            if let Some(saved) = self.store.put_if_version(next, expected).await? {
                return Ok(saved);
            }

            tracing::debug!(%product_id, attempt, "version conflict, retrying");
        }

        Err(InventoryError::ConcurrencyConflict {
            product_id: product_id.clone(),
            detail: format!("gave up after {} attempts", self.config.max_retries),
        })
    }

    /// Read-mutate-write under the engine's own per-product lock.
    ///
    /// Correct only while this engine instance is the sole writer to the
    /// store for the product.
    async fn mutate_application<F>(&self, product_id: &ProductId, mutation: F) -> Result<InventoryRecord>
    where
        F: Fn(&mut InventoryRecord) -> Result<()>,
    {
        let _guard = self.app_locks.acquire(product_id).await;

        let mut record = self.require(product_id).await?;
        mutation(&mut record)?;
        self.store.put(record).await
    }

    async fn require(&self, product_id: &ProductId) -> Result<InventoryRecord> {
        self.store
            .find(product_id)
            .await?
            .ok_or_else(|| InventoryError::ProductNotFound {
                product_id: product_id.clone(),
            })
    }
}
