//! Inventory reservation engine.
//!
//! Serializes concurrent reservation attempts against per-product stock
//! records under one of three interchangeable locking strategies, selected
//! once at startup:
//!
//! - **Pessimistic**: an exclusive per-product row lock held by the store
//!   for the duration of a read-mutate-write cycle, with a bounded wait.
//! - **Optimistic**: versioned reads with atomic conditional writes,
//!   retried a bounded number of times.
//! - **Application-level**: a process-local lock table owned by the engine;
//!   serializes only callers within this process instance.

mod engine;
mod error;
mod locks;
mod memory;
mod record;
mod store;

pub use engine::{EngineConfig, LockingStrategy, ReservationEngine};
pub use error::{InventoryError, Result};
pub use locks::ProductLockMap;
pub use memory::InMemoryInventoryStore;
pub use record::{InventoryRecord, StockStatus, Version};
pub use store::{InventoryStore, ProductLock};
