//! Concurrency properties of the reservation engine.
//!
//! Drives N concurrent reservations against limited stock and checks that
//! every strategy admits exactly as many winners as there are units, with
//! no lost updates.

use std::sync::Arc;
use std::time::Duration;

use common::{Money, OrderId, ProductId};
use inventory::{
    EngineConfig, InMemoryInventoryStore, InventoryError, InventoryRecord, InventoryStore,
    LockingStrategy, ReservationEngine,
};
use tokio::sync::Barrier;

/// Retry bound high enough that an optimistic writer can only give up once
/// stock is genuinely gone: each lost CAS implies some other writer
/// committed, and total commits are bounded by the task count.
fn contention_config() -> EngineConfig {
    EngineConfig {
        lock_wait: Duration::from_secs(5),
        max_retries: 64,
    }
}

async fn engine_with_stock(
    strategy: LockingStrategy,
    available: u32,
) -> Arc<ReservationEngine<InMemoryInventoryStore>> {
    let store = InMemoryInventoryStore::new();
    store
        .insert(InventoryRecord::new(
            "SKU-001",
            "Widget",
            available,
            Money::from_cents(1000),
        ))
        .await
        .unwrap();
    Arc::new(ReservationEngine::with_config(
        store,
        strategy,
        contention_config(),
    ))
}

/// Spawns `tasks` single-unit reservations through a barrier and returns
/// (successes, insufficient-or-conflict failures).
async fn run_unit_reservations(
    engine: Arc<ReservationEngine<InMemoryInventoryStore>>,
    tasks: usize,
) -> (usize, usize) {
    let barrier = Arc::new(Barrier::new(tasks));
    let product_id = ProductId::new("SKU-001");

    let handles: Vec<_> = (0..tasks)
        .map(|_| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            let product_id = product_id.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                engine.reserve(&product_id, 1, OrderId::new()).await
            })
        })
        .collect();

    let mut successes = 0;
    let mut failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(
                InventoryError::InsufficientStock { .. }
                | InventoryError::ConcurrencyConflict { .. },
            ) => failures += 1,
            Err(other) => panic!("unexpected error kind: {other}"),
        }
    }
    (successes, failures)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn exactly_m_of_n_succeed_under_every_strategy() {
    for strategy in [
        LockingStrategy::Pessimistic,
        LockingStrategy::Optimistic,
        LockingStrategy::Application,
    ] {
        let engine = engine_with_stock(strategy, 5).await;
        let (successes, failures) = run_unit_reservations(engine.clone(), 12).await;

        assert_eq!(successes, 5, "strategy {strategy}");
        assert_eq!(failures, 7, "strategy {strategy}");

        let record = engine
            .store()
            .find(&ProductId::new("SKU-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.available(), 0, "strategy {strategy}");
        assert_eq!(record.reserved(), 5, "strategy {strategy}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn ten_contenders_one_unit_pessimistic() {
    let engine = engine_with_stock(LockingStrategy::Pessimistic, 1).await;
    let (successes, failures) = run_unit_reservations(engine.clone(), 10).await;

    assert_eq!(successes, 1);
    assert_eq!(failures, 9);

    let record = engine
        .store()
        .find(&ProductId::new("SKU-001"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.available(), 0);
    assert_eq!(record.reserved(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn no_lost_updates_with_mixed_reserve_release() {
    let engine = engine_with_stock(LockingStrategy::Optimistic, 20).await;
    let product_id = ProductId::new("SKU-001");
    let barrier = Arc::new(Barrier::new(10));

    // 10 tasks each reserve 2 then release 2; counters must end unchanged.
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            let product_id = product_id.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                let order_id = OrderId::new();
                engine.reserve(&product_id, 2, order_id).await.unwrap();
                engine.release(&product_id, 2, order_id).await.unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let record = engine
        .store()
        .find(&product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.available(), 20);
    assert_eq!(record.reserved(), 0);
    assert_eq!(record.total_units(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn conservation_holds_under_contention_for_every_strategy() {
    for strategy in [
        LockingStrategy::Pessimistic,
        LockingStrategy::Optimistic,
        LockingStrategy::Application,
    ] {
        let engine = engine_with_stock(strategy, 6).await;
        let (successes, _failures) = run_unit_reservations(engine.clone(), 9).await;

        let record = engine
            .store()
            .find(&ProductId::new("SKU-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.total_units(), 6, "strategy {strategy}");
        assert_eq!(record.reserved() as usize, successes, "strategy {strategy}");
    }
}
