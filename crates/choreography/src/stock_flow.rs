//! Inventory-side choreography: reserve on initiation, release on
//! cancellation, compensate partial failures.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bus::events::{
    ItemRequest, OrderCancelled, OrderInitiated, ReservedItem, StockReleased, StockReserved,
    StockReservationFailed,
};
use bus::{EventBus, EventBusExt, EventHandler, HandlerError};
use common::{OrderId, ProductId};
use inventory::{InventoryError, InventoryRecord, InventoryStore, ReservationEngine};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// What an order currently holds in reserved stock.
#[derive(Debug, Clone)]
struct LedgerEntry {
    reservation_id: String,
    items: Vec<(ProductId, u32)>,
}

/// Reservations held per order, so a later cancellation knows what to
/// release; the `order.cancelled` payload carries no quantities.
#[derive(Clone, Default)]
pub struct ReservationLedger {
    entries: Arc<RwLock<HashMap<OrderId, LedgerEntry>>>,
}

impl ReservationLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    async fn record(&self, order_id: OrderId, reservation_id: String, items: Vec<(ProductId, u32)>) {
        self.entries.write().await.insert(
            order_id,
            LedgerEntry {
                reservation_id,
                items,
            },
        );
    }

    async fn take(&self, order_id: OrderId) -> Option<LedgerEntry> {
        self.entries.write().await.remove(&order_id)
    }

    /// Returns the number of orders with live reservations.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no reservations are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// A reservation attempt that stopped at `product_id`.
struct ReserveFailure {
    product_id: ProductId,
    quantity: u32,
    error: InventoryError,
}

/// Reacts to order events with reservations and releases.
pub struct StockReservationHandler<S: InventoryStore, B: EventBus> {
    engine: Arc<ReservationEngine<S>>,
    bus: B,
    ledger: ReservationLedger,
}

impl<S: InventoryStore, B: EventBus> StockReservationHandler<S, B> {
    /// Creates the handler.
    pub fn new(engine: Arc<ReservationEngine<S>>, bus: B, ledger: ReservationLedger) -> Self {
        Self {
            engine,
            bus,
            ledger,
        }
    }

    /// Reserves every item of the order, compensating on partial failure.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    async fn on_order_initiated(&self, event: OrderInitiated) -> Result<()> {
        match self.reserve_all(&event).await {
            Ok(reserved) => {
                let reservation_id = format!("RES-{}", Uuid::new_v4().simple());
                self.ledger
                    .record(
                        event.order_id,
                        reservation_id.clone(),
                        reserved
                            .iter()
                            .map(|(item, _)| (item.product_id.clone(), item.quantity))
                            .collect(),
                    )
                    .await;

                let items = reserved
                    .into_iter()
                    .map(|(item, record)| ReservedItem {
                        product_id: record.product_id().clone(),
                        product_name: record.product_name().to_string(),
                        quantity: item.quantity,
                        unit_price: record.price(),
                    })
                    .collect();

                self.bus
                    .publish_event(
                        bus::topics::STOCK_RESERVED,
                        &StockReserved::new(event.order_id, reservation_id, items),
                    )
                    .await?;

                metrics::counter!("stock_reservations_total").increment(1);
                Ok(())
            }
            Err(failure) if failure.error.is_infrastructure() => Err(failure.error.into()),
            Err(failure) => {
                let available = self.available_stock(&failure.product_id).await;

                self.bus
                    .publish_event(
                        bus::topics::STOCK_RESERVATION_FAILED,
                        &StockReservationFailed::new(
                            event.order_id,
                            failure.product_id,
                            failure.error.to_string(),
                            available,
                            failure.quantity,
                        ),
                    )
                    .await?;

                metrics::counter!("stock_reservation_failures_total").increment(1);
                Ok(())
            }
        }
    }

    /// Reserves items one by one; on the first failure releases everything
    /// already reserved and reports the original error.
    async fn reserve_all(
        &self,
        event: &OrderInitiated,
    ) -> std::result::Result<Vec<(ItemRequest, InventoryRecord)>, ReserveFailure> {
        let mut reserved: Vec<(ItemRequest, InventoryRecord)> = Vec::with_capacity(event.items.len());

        for item in &event.items {
            match self
                .engine
                .reserve(&item.product_id, item.quantity, event.order_id)
                .await
            {
                Ok(record) => reserved.push((item.clone(), record)),
                Err(error) => {
                    tracing::warn!(
                        order_id = %event.order_id,
                        product_id = %item.product_id,
                        error = %error,
                        "reservation stopped, compensating {} item(s)",
                        reserved.len()
                    );

                    // Best effort: failures here are logged, never retried,
                    // and never mask the original error.
                    for (done, _) in &reserved {
                        if let Err(release_err) = self
                            .engine
                            .release(&done.product_id, done.quantity, event.order_id)
                            .await
                        {
                            tracing::error!(
                                order_id = %event.order_id,
                                product_id = %done.product_id,
                                error = %release_err,
                                "compensating release failed"
                            );
                        }
                    }
                    metrics::counter!("stock_compensations_total").increment(1);

                    return Err(ReserveFailure {
                        product_id: item.product_id.clone(),
                        quantity: item.quantity,
                        error,
                    });
                }
            }
        }

        Ok(reserved)
    }

    /// Releases whatever the cancelled order still holds.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    async fn on_order_cancelled(&self, event: OrderCancelled) -> Result<()> {
        let Some(entry) = self.ledger.take(event.order_id).await else {
            tracing::debug!(order_id = %event.order_id, "no reservation held, nothing to release");
            return Ok(());
        };

        for (product_id, quantity) in &entry.items {
            if let Err(release_err) = self
                .engine
                .release(product_id, *quantity, event.order_id)
                .await
            {
                tracing::error!(
                    order_id = %event.order_id,
                    %product_id,
                    error = %release_err,
                    "release after cancellation failed"
                );
            }
        }

        self.bus
            .publish_event(
                bus::topics::STOCK_RELEASED,
                &StockReleased::new(event.order_id, entry.reservation_id),
            )
            .await?;

        metrics::counter!("stock_releases_total").increment(1);
        Ok(())
    }

    async fn available_stock(&self, product_id: &ProductId) -> u32 {
        match self.engine.store().find(product_id).await {
            Ok(Some(record)) => record.available(),
            _ => 0,
        }
    }
}

#[async_trait]
impl<S: InventoryStore, B: EventBus> EventHandler for StockReservationHandler<S, B> {
    async fn handle(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> std::result::Result<(), HandlerError> {
        match topic {
            bus::topics::ORDER_INITIATED => {
                let event: OrderInitiated = serde_json::from_value(payload.clone())
                    .map_err(|err| HandlerError::Rejected(err.to_string()))?;
                self.on_order_initiated(event).await.map_err(HandlerError::from)
            }
            bus::topics::ORDER_CANCELLED => {
                let event: OrderCancelled = serde_json::from_value(payload.clone())
                    .map_err(|err| HandlerError::Rejected(err.to_string()))?;
                self.on_order_cancelled(event).await.map_err(HandlerError::from)
            }
            other => Err(HandlerError::Rejected(format!(
                "unexpected topic for stock handler: {other}"
            ))),
        }
    }
}
