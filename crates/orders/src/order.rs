//! Order aggregate.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{OrderError, Result};
use crate::status::OrderStatus;

/// A line item in an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Human-readable product name.
    pub product_name: String,

    /// Quantity ordered.
    pub quantity: u32,

    /// Price per unit.
    pub unit_price: Money,

    /// Line total (quantity × unit price).
    pub subtotal: Money,
}

impl OrderItem {
    /// Creates a new item, computing the subtotal.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self> {
        let product_id = product_id.into();
        if quantity == 0 {
            return Err(OrderError::InvalidItem(format!(
                "quantity must be positive for {product_id}"
            )));
        }
        if unit_price.is_negative() {
            return Err(OrderError::InvalidItem(format!(
                "unit price must not be negative for {product_id}"
            )));
        }

        Ok(Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            subtotal: unit_price.multiply(quantity),
            unit_price,
        })
    }

    /// Creates a placeholder item with unknown pricing.
    ///
    /// Used at initiation time; real name and price arrive with the stock
    /// reservation.
    pub fn placeholder(product_id: impl Into<ProductId>, quantity: u32) -> Result<Self> {
        Self::new(product_id, "TBD", quantity, Money::zero())
    }
}

/// The order aggregate.
///
/// Transitions return new immutable snapshots; every construction path
/// re-validates that each subtotal matches quantity × unit price and that
/// the total matches the sum of subtotals (both within one cent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    order_id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    items: Vec<OrderItem>,
    total_amount: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new PENDING order.
    pub fn initiate(order_id: OrderId, user_id: UserId, items: Vec<OrderItem>) -> Result<Self> {
        let total_amount = items.iter().map(|item| item.subtotal).sum();
        let now = Utc::now();

        Self {
            order_id,
            user_id,
            status: OrderStatus::Pending,
            items,
            total_amount,
            created_at: now,
            updated_at: now,
        }
        .validated()
    }

    /// Returns the order ID.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the user who placed the order.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the order items.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the order total.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns when the order was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the order was last updated.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns (product, quantity) pairs for stock reservation.
    pub fn items_for_reservation(&self) -> Vec<(ProductId, u32)> {
        self.items
            .iter()
            .map(|item| (item.product_id.clone(), item.quantity))
            .collect()
    }

    /// Confirms the order. Only valid while PENDING.
    pub fn confirm(&self) -> Result<Order> {
        if !self.status.can_confirm() {
            return Err(OrderError::InvalidStatus {
                current: self.status,
                action: "confirm",
            });
        }
        self.transitioned(OrderStatus::Confirmed)
    }

    /// Marks the order as failed. Only valid while PENDING.
    pub fn fail(&self) -> Result<Order> {
        if !self.status.can_fail() {
            return Err(OrderError::InvalidStatus {
                current: self.status,
                action: "fail",
            });
        }
        self.transitioned(OrderStatus::Failed)
    }

    /// Cancels the order. Valid while PENDING or CONFIRMED.
    pub fn cancel(&self) -> Result<Order> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStatus {
                current: self.status,
                action: "cancel",
            });
        }
        self.transitioned(OrderStatus::Cancelled)
    }

    /// Returns a snapshot with the given items and a recomputed total.
    ///
    /// Used when reservation data replaces placeholder pricing; the status
    /// is untouched.
    pub fn with_priced_items(&self, items: Vec<OrderItem>) -> Result<Order> {
        let total_amount = items.iter().map(|item| item.subtotal).sum();

        Order {
            items,
            total_amount,
            updated_at: Utc::now(),
            ..self.clone()
        }
        .validated()
    }

    fn transitioned(&self, status: OrderStatus) -> Result<Order> {
        Order {
            status,
            updated_at: Utc::now(),
            ..self.clone()
        }
        .validated()
    }

    /// Re-checks the pricing invariant on every construction path.
    fn validated(self) -> Result<Self> {
        if self.items.is_empty() {
            return Err(OrderError::InvalidItem(
                "order must have at least one item".to_string(),
            ));
        }

        for item in &self.items {
            let expected = item.unit_price.multiply(item.quantity);
            if !item.subtotal.approx_eq(expected) {
                return Err(OrderError::InvalidItem(format!(
                    "subtotal for {} is {}, expected {}",
                    item.product_id, item.subtotal, expected
                )));
            }
        }

        let expected_total: Money = self.items.iter().map(|item| item.subtotal).sum();
        if !self.total_amount.approx_eq(expected_total) {
            return Err(OrderError::InvalidItem(format!(
                "total {} does not match sum of subtotals {}",
                self.total_amount, expected_total
            )));
        }

        Ok(self)
    }
}
