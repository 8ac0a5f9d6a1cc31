//! Order persistence seam.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::error::OrderError;
use crate::order::Order;
use crate::Result;

/// Store interface for order aggregates.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order.
    async fn save(&self, order: Order) -> Result<Order>;

    /// Replaces an existing order with a new snapshot.
    async fn update(&self, order: Order) -> Result<Order>;

    /// Looks up an order by ID.
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>>;
}

/// In-memory order repository.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: Order) -> Result<Order> {
        self.orders
            .write()
            .await
            .insert(order.order_id(), order.clone());
        Ok(order)
    }

    async fn update(&self, order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.order_id()) {
            return Err(OrderError::NotFound {
                order_id: order.order_id(),
            });
        }
        orders.insert(order.order_id(), order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }
}
