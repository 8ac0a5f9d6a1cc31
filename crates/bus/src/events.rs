//! Typed wire payloads for each topic.
//!
//! Field names are camelCase on the wire so every service, whatever its
//! implementation language, sees the same shapes.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// An item requested for reservation, before pricing is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A fully priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A reserved item with the pricing the inventory service settled on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Payload for `order.initiated`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInitiated {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub items: Vec<ItemRequest>,
    pub timestamp: DateTime<Utc>,
}

impl OrderInitiated {
    pub fn new(order_id: OrderId, user_id: UserId, items: Vec<ItemRequest>) -> Self {
        Self {
            order_id,
            user_id,
            items,
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `order.created`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub items: Vec<PricedItem>,
    pub total_amount: Money,
    pub timestamp: DateTime<Utc>,
}

impl OrderCreated {
    pub fn new(
        order_id: OrderId,
        user_id: UserId,
        items: Vec<PricedItem>,
        total_amount: Money,
    ) -> Self {
        Self {
            order_id,
            user_id,
            items,
            total_amount,
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `order.confirmed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmed {
    pub order_id: OrderId,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderConfirmed {
    pub fn new(order_id: OrderId, status: impl Into<String>) -> Self {
        Self {
            order_id,
            status: status.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `order.failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFailed {
    pub order_id: OrderId,
    pub reason: String,
    pub failed_step: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderFailed {
    pub fn new(
        order_id: OrderId,
        reason: impl Into<String>,
        failed_step: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            reason: reason.into(),
            failed_step: failed_step.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `order.cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl OrderCancelled {
    pub fn new(order_id: OrderId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `stock.reserved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReserved {
    pub order_id: OrderId,
    pub reservation_id: String,
    pub items: Vec<ReservedItem>,
    pub timestamp: DateTime<Utc>,
}

impl StockReserved {
    pub fn new(order_id: OrderId, reservation_id: impl Into<String>, items: Vec<ReservedItem>) -> Self {
        Self {
            order_id,
            reservation_id: reservation_id.into(),
            items,
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `stock.reservation.failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReservationFailed {
    pub order_id: OrderId,
    pub failed_product_id: ProductId,
    pub reason: String,
    pub available_stock: u32,
    pub requested_quantity: u32,
    pub timestamp: DateTime<Utc>,
}

impl StockReservationFailed {
    pub fn new(
        order_id: OrderId,
        failed_product_id: ProductId,
        reason: impl Into<String>,
        available_stock: u32,
        requested_quantity: u32,
    ) -> Self {
        Self {
            order_id,
            failed_product_id,
            reason: reason.into(),
            available_stock,
            requested_quantity,
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `stock.released`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReleased {
    pub order_id: OrderId,
    pub reservation_id: String,
    pub timestamp: DateTime<Utc>,
}

impl StockReleased {
    pub fn new(order_id: OrderId, reservation_id: impl Into<String>) -> Self {
        Self {
            order_id,
            reservation_id: reservation_id.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_initiated_wire_shape() {
        let event = OrderInitiated::new(
            OrderId::new(),
            UserId::new(),
            vec![ItemRequest {
                product_id: ProductId::new("SKU-001"),
                quantity: 2,
            }],
        );

        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("orderId").is_some());
        assert!(value.get("userId").is_some());
        assert_eq!(value["items"][0]["productId"], "SKU-001");
        assert_eq!(value["items"][0]["quantity"], 2);
    }

    #[test]
    fn test_stock_reservation_failed_wire_shape() {
        let event = StockReservationFailed::new(
            OrderId::new(),
            ProductId::new("SKU-002"),
            "insufficient stock",
            1,
            5,
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["failedProductId"], "SKU-002");
        assert_eq!(value["availableStock"], 1);
        assert_eq!(value["requestedQuantity"], 5);
    }

    #[test]
    fn test_priced_item_money_serializes_as_number() {
        let item = PricedItem {
            product_id: ProductId::new("SKU-001"),
            product_name: "Widget".to_string(),
            quantity: 2,
            unit_price: Money::from_cents(1000),
            subtotal: Money::from_cents(2000),
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["unitPrice"], 1000);
        assert_eq!(value["subtotal"], 2000);
    }

    #[test]
    fn test_roundtrip_through_wire() {
        let event = StockReserved::new(
            OrderId::new(),
            "RES-0001",
            vec![ReservedItem {
                product_id: ProductId::new("SKU-001"),
                product_name: "Widget".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(1000),
            }],
        );

        let value = serde_json::to_value(&event).unwrap();
        let parsed: StockReserved = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.order_id, event.order_id);
        assert_eq!(parsed.items, event.items);
    }
}
