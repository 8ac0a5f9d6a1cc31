use std::sync::Arc;

use common::{Money, OrderId, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use inventory::{
    InMemoryInventoryStore, InventoryRecord, InventoryStore, LockingStrategy, ReservationEngine,
};

fn setup(
    rt: &tokio::runtime::Runtime,
    strategy: LockingStrategy,
) -> Arc<ReservationEngine<InMemoryInventoryStore>> {
    let store = InMemoryInventoryStore::new();
    rt.block_on(async {
        store
            .insert(InventoryRecord::new(
                "SKU-BENCH",
                "Benchmark Widget",
                u32::MAX / 2,
                Money::from_cents(1000),
            ))
            .await
            .unwrap();
    });
    Arc::new(ReservationEngine::new(store, strategy))
}

fn bench_reserve_release_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    for strategy in [
        LockingStrategy::Pessimistic,
        LockingStrategy::Optimistic,
        LockingStrategy::Application,
    ] {
        let engine = setup(&rt, strategy);
        let product_id = ProductId::new("SKU-BENCH");

        c.bench_function(&format!("inventory/reserve_release/{strategy}"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let order_id = OrderId::new();
                    engine.reserve(&product_id, 1, order_id).await.unwrap();
                    engine.release(&product_id, 1, order_id).await.unwrap();
                });
            });
        });
    }
}

fn bench_contended_reserve(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    for strategy in [
        LockingStrategy::Pessimistic,
        LockingStrategy::Optimistic,
        LockingStrategy::Application,
    ] {
        let engine = setup(&rt, strategy);

        c.bench_function(&format!("inventory/contended_8way/{strategy}"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let product_id = ProductId::new("SKU-BENCH");
                    let handles: Vec<_> = (0..8)
                        .map(|_| {
                            let engine = engine.clone();
                            let product_id = product_id.clone();
                            tokio::spawn(async move {
                                let order_id = OrderId::new();
                                engine.reserve(&product_id, 1, order_id).await.unwrap();
                                engine.release(&product_id, 1, order_id).await.unwrap();
                            })
                        })
                        .collect();
                    for handle in handles {
                        handle.await.unwrap();
                    }
                });
            });
        });
    }
}

criterion_group!(benches, bench_reserve_release_cycle, bench_contended_reserve);
criterion_main!(benches);
