//! Gateway-facing order commands.

use bus::events::{ItemRequest, OrderCancelled, OrderInitiated};
use bus::{EventBus, EventBusExt};
use common::{OrderId, UserId};
use orders::{Order, OrderError, OrderItem, OrderRepository};

use crate::error::Result;

/// Synchronous entry points into the choreography.
///
/// `initiate` returns as soon as the PENDING order is persisted and the
/// `order.initiated` event is on the bus; reservation and confirmation
/// proceed asynchronously.
pub struct OrderCommands<R: OrderRepository, B: EventBus> {
    orders: R,
    bus: B,
}

impl<R: OrderRepository, B: EventBus> OrderCommands<R, B> {
    /// Creates the command service.
    pub fn new(orders: R, bus: B) -> Self {
        Self { orders, bus }
    }

    /// Creates a PENDING order with placeholder pricing and announces it.
    #[tracing::instrument(skip(self, items))]
    pub async fn initiate(&self, user_id: UserId, items: Vec<ItemRequest>) -> Result<Order> {
        let order_items = items
            .iter()
            .map(|item| OrderItem::placeholder(item.product_id.clone(), item.quantity))
            .collect::<orders::Result<Vec<_>>>()?;

        let order = Order::initiate(OrderId::new(), user_id, order_items)?;
        let order = self.orders.save(order).await?;

        self.bus
            .publish_event(
                bus::topics::ORDER_INITIATED,
                &OrderInitiated::new(order.order_id(), user_id, items),
            )
            .await?;

        metrics::counter!("orders_initiated_total").increment(1);
        tracing::info!(order_id = %order.order_id(), "order initiated");

        Ok(order)
    }

    /// Cancels an order and announces the cancellation.
    ///
    /// Transition errors propagate to the caller; nothing is published on
    /// failure.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId, reason: impl Into<String> + std::fmt::Debug) -> Result<Order> {
        let reason = reason.into();
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound { order_id })?;

        let cancelled = order.cancel()?;
        let cancelled = self.orders.update(cancelled).await?;

        self.bus
            .publish_event(
                bus::topics::ORDER_CANCELLED,
                &OrderCancelled::new(order_id, reason),
            )
            .await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(%order_id, "order cancelled");

        Ok(cancelled)
    }

    /// Loads an order by ID.
    pub async fn get(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound { order_id }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::InMemoryBus;
    use common::ProductId;
    use orders::{InMemoryOrderRepository, OrderStatus};

    fn items() -> Vec<ItemRequest> {
        vec![
            ItemRequest {
                product_id: ProductId::new("SKU-001"),
                quantity: 2,
            },
            ItemRequest {
                product_id: ProductId::new("SKU-002"),
                quantity: 1,
            },
        ]
    }

    fn commands() -> (
        OrderCommands<InMemoryOrderRepository, InMemoryBus>,
        InMemoryOrderRepository,
        InMemoryBus,
    ) {
        let repo = InMemoryOrderRepository::new();
        let bus = InMemoryBus::new();
        (OrderCommands::new(repo.clone(), bus.clone()), repo, bus)
    }

    #[tokio::test]
    async fn test_initiate_persists_pending_order_and_publishes() {
        let (commands, repo, bus) = commands();
        let mut rx = bus.subscribe(bus::topics::ORDER_INITIATED).await;

        let order = commands.initiate(UserId::new(), items()).await.unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.total_amount().cents(), 0);
        assert_eq!(repo.order_count().await, 1);

        let delivery = rx.recv().await.unwrap();
        assert_eq!(
            delivery.payload["orderId"],
            serde_json::json!(order.order_id())
        );
        assert_eq!(delivery.payload["items"][0]["productId"], "SKU-001");
    }

    #[tokio::test]
    async fn test_initiate_with_zero_quantity_fails_without_publishing() {
        let (commands, repo, bus) = commands();
        let mut rx = bus.subscribe(bus::topics::ORDER_INITIATED).await;

        let result = commands
            .initiate(
                UserId::new(),
                vec![ItemRequest {
                    product_id: ProductId::new("SKU-001"),
                    quantity: 0,
                }],
            )
            .await;

        assert!(result.is_err());
        assert_eq!(repo.order_count().await, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_pending_order_publishes_cancellation() {
        let (commands, _repo, bus) = commands();
        let mut rx = bus.subscribe(bus::topics::ORDER_CANCELLED).await;

        let order = commands.initiate(UserId::new(), items()).await.unwrap();
        let cancelled = commands
            .cancel(order.order_id(), "user changed their mind")
            .await
            .unwrap();

        assert_eq!(cancelled.status(), OrderStatus::Cancelled);

        let delivery = rx.recv().await.unwrap();
        assert_eq!(delivery.payload["reason"], "user changed their mind");
    }

    #[tokio::test]
    async fn test_cancel_unknown_order_errors() {
        let (commands, _, _) = commands();
        let result = commands.cancel(OrderId::new(), "nope").await;
        assert!(matches!(
            result,
            Err(crate::ChoreographyError::Order(OrderError::NotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_cancel_failed_order_propagates_invalid_status() {
        let (commands, repo, bus) = commands();
        let mut rx = bus.subscribe(bus::topics::ORDER_CANCELLED).await;

        let order = commands.initiate(UserId::new(), items()).await.unwrap();
        let failed = order.fail().unwrap();
        repo.update(failed).await.unwrap();

        let result = commands.cancel(order.order_id(), "too late").await;
        assert!(matches!(
            result,
            Err(crate::ChoreographyError::Order(
                OrderError::InvalidStatus { .. }
            ))
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_get_returns_current_snapshot() {
        let (commands, _, _) = commands();
        let order = commands.initiate(UserId::new(), items()).await.unwrap();

        let loaded = commands.get(order.order_id()).await.unwrap();
        assert_eq!(loaded.order_id(), order.order_id());

        let missing = commands.get(OrderId::new()).await;
        assert!(missing.is_err());
    }
}
