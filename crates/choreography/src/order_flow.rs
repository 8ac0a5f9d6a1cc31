//! Order-side choreography: confirm on reservation, fail on reservation
//! failure.

use async_trait::async_trait;
use bus::events::{
    OrderConfirmed, OrderCreated, OrderFailed, PricedItem, StockReservationFailed, StockReserved,
};
use bus::{EventBus, EventBusExt, EventHandler, HandlerError};
use orders::{Order, OrderError, OrderItem, OrderRepository, OrderStatus};

use crate::error::Result;
use crate::steps;

/// Reacts to stock events by driving the order state machine.
pub struct OrderLifecycleHandler<R: OrderRepository, B: EventBus> {
    orders: R,
    bus: B,
}

impl<R: OrderRepository, B: EventBus> OrderLifecycleHandler<R, B> {
    /// Creates the handler.
    pub fn new(orders: R, bus: B) -> Self {
        Self { orders, bus }
    }

    /// Confirms the order with the pricing the reservation settled on.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    async fn on_stock_reserved(&self, event: StockReserved) -> Result<()> {
        let order = self
            .orders
            .find_by_id(event.order_id)
            .await?
            .ok_or(OrderError::NotFound {
                order_id: event.order_id,
            })?;

        // A replayed delivery for an already-confirmed order is a duplicate,
        // not a failure.
        if order.status() == OrderStatus::Confirmed {
            tracing::debug!(order_id = %event.order_id, "duplicate stock.reserved delivery ignored");
            return Ok(());
        }

        match self.confirm(&order, &event).await {
            Ok(confirmed) => {
                let items: Vec<PricedItem> = confirmed
                    .items()
                    .iter()
                    .map(|item| PricedItem {
                        product_id: item.product_id.clone(),
                        product_name: item.product_name.clone(),
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                        subtotal: item.subtotal,
                    })
                    .collect();

                self.bus
                    .publish_event(
                        bus::topics::ORDER_CREATED,
                        &OrderCreated::new(
                            confirmed.order_id(),
                            confirmed.user_id(),
                            items,
                            confirmed.total_amount(),
                        ),
                    )
                    .await?;

                self.bus
                    .publish_event(
                        bus::topics::ORDER_CONFIRMED,
                        &OrderConfirmed::new(confirmed.order_id(), confirmed.status().as_str()),
                    )
                    .await?;

                metrics::counter!("orders_confirmed_total").increment(1);
                tracing::info!(order_id = %event.order_id, "order confirmed");
                Ok(())
            }
            Err(err) if err.is_infrastructure() => Err(err),
            Err(err) => {
                tracing::warn!(
                    order_id = %event.order_id,
                    error = %err,
                    "confirmation failed, failing order"
                );
                self.fail_order(&order, err.to_string(), steps::ORDER_CONFIRMATION)
                    .await;
                Ok(())
            }
        }
    }

    async fn confirm(&self, order: &Order, event: &StockReserved) -> Result<Order> {
        let mut priced = Vec::with_capacity(order.items().len());
        for item in order.items() {
            let reserved = event
                .items
                .iter()
                .find(|reserved| reserved.product_id == item.product_id)
                .ok_or_else(|| {
                    OrderError::InvalidItem(format!(
                        "product {} missing from reservation",
                        item.product_id
                    ))
                })?;

            priced.push(OrderItem::new(
                reserved.product_id.clone(),
                reserved.product_name.clone(),
                reserved.quantity,
                reserved.unit_price,
            )?);
        }

        let confirmed = order.with_priced_items(priced)?.confirm()?;
        Ok(self.orders.update(confirmed).await?)
    }

    /// Fails the order after a reservation failure.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    async fn on_reservation_failed(&self, event: StockReservationFailed) -> Result<()> {
        let order = self
            .orders
            .find_by_id(event.order_id)
            .await?
            .ok_or(OrderError::NotFound {
                order_id: event.order_id,
            })?;

        if order.status() == OrderStatus::Failed {
            tracing::debug!(
                order_id = %event.order_id,
                "duplicate stock.reservation.failed delivery ignored"
            );
            return Ok(());
        }

        let reason = format!(
            "insufficient stock for {}: {}",
            event.failed_product_id, event.reason
        );
        self.fail_order(&order, reason, steps::STOCK_RESERVATION).await;
        Ok(())
    }

    /// Fails and persists the order, then announces it.
    ///
    /// If the transition or the write itself fails, the error is logged and
    /// swallowed so the inbound message is still acknowledged.
    async fn fail_order(&self, order: &Order, reason: String, failed_step: &str) {
        let failed = match order.fail() {
            Ok(failed) => failed,
            Err(err) => {
                tracing::error!(
                    order_id = %order.order_id(),
                    error = %err,
                    "could not mark order as failed"
                );
                return;
            }
        };

        if let Err(err) = self.orders.update(failed).await {
            tracing::error!(
                order_id = %order.order_id(),
                error = %err,
                "could not persist failed order"
            );
            return;
        }

        if let Err(err) = self
            .bus
            .publish_event(
                bus::topics::ORDER_FAILED,
                &OrderFailed::new(order.order_id(), reason, failed_step),
            )
            .await
        {
            tracing::error!(
                order_id = %order.order_id(),
                error = %err,
                "could not publish order.failed"
            );
            return;
        }

        metrics::counter!("orders_failed_total").increment(1);
        tracing::info!(order_id = %order.order_id(), failed_step, "order failed");
    }
}

#[async_trait]
impl<R: OrderRepository, B: EventBus> EventHandler for OrderLifecycleHandler<R, B> {
    async fn handle(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> std::result::Result<(), HandlerError> {
        match topic {
            bus::topics::STOCK_RESERVED => {
                let event: StockReserved = serde_json::from_value(payload.clone())
                    .map_err(|err| HandlerError::Rejected(err.to_string()))?;
                self.on_stock_reserved(event).await.map_err(HandlerError::from)
            }
            bus::topics::STOCK_RESERVATION_FAILED => {
                let event: StockReservationFailed = serde_json::from_value(payload.clone())
                    .map_err(|err| HandlerError::Rejected(err.to_string()))?;
                self.on_reservation_failed(event)
                    .await
                    .map_err(HandlerError::from)
            }
            other => Err(HandlerError::Rejected(format!(
                "unexpected topic for order handler: {other}"
            ))),
        }
    }
}
