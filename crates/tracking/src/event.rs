//! Tracking event model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version stamped into every recorded event's metadata.
const SCHEMA_VERSION: &str = "1";

/// The closed set of domain event types the log accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "order.initiated")]
    OrderInitiated,
    #[serde(rename = "order.created")]
    OrderCreated,
    #[serde(rename = "order.confirmed")]
    OrderConfirmed,
    #[serde(rename = "order.failed")]
    OrderFailed,
    #[serde(rename = "order.cancelled")]
    OrderCancelled,
    #[serde(rename = "stock.reserved")]
    StockReserved,
    #[serde(rename = "stock.reservation.failed")]
    StockReservationFailed,
    #[serde(rename = "stock.released")]
    StockReleased,
}

impl EventType {
    /// Maps a topic name to its event type.
    pub fn from_topic(topic: &str) -> Option<Self> {
        match topic {
            bus::topics::ORDER_INITIATED => Some(EventType::OrderInitiated),
            bus::topics::ORDER_CREATED => Some(EventType::OrderCreated),
            bus::topics::ORDER_CONFIRMED => Some(EventType::OrderConfirmed),
            bus::topics::ORDER_FAILED => Some(EventType::OrderFailed),
            bus::topics::ORDER_CANCELLED => Some(EventType::OrderCancelled),
            bus::topics::STOCK_RESERVED => Some(EventType::StockReserved),
            bus::topics::STOCK_RESERVATION_FAILED => Some(EventType::StockReservationFailed),
            bus::topics::STOCK_RELEASED => Some(EventType::StockReleased),
            _ => None,
        }
    }

    /// Returns the topic name for this event type.
    pub fn as_topic(&self) -> &'static str {
        match self {
            EventType::OrderInitiated => bus::topics::ORDER_INITIATED,
            EventType::OrderCreated => bus::topics::ORDER_CREATED,
            EventType::OrderConfirmed => bus::topics::ORDER_CONFIRMED,
            EventType::OrderFailed => bus::topics::ORDER_FAILED,
            EventType::OrderCancelled => bus::topics::ORDER_CANCELLED,
            EventType::StockReserved => bus::topics::STOCK_RESERVED,
            EventType::StockReservationFailed => bus::topics::STOCK_RESERVATION_FAILED,
            EventType::StockReleased => bus::topics::STOCK_RELEASED,
        }
    }

    /// Returns the service that originates this event type.
    pub fn source(&self) -> EventSource {
        match self {
            EventType::OrderInitiated
            | EventType::OrderCreated
            | EventType::OrderConfirmed
            | EventType::OrderFailed
            | EventType::OrderCancelled => EventSource::OrderService,
            EventType::StockReserved
            | EventType::StockReservationFailed
            | EventType::StockReleased => EventSource::InventoryService,
        }
    }

    /// Returns true for order lifecycle events.
    pub fn is_order_event(&self) -> bool {
        self.as_topic().starts_with("order.")
    }

    /// Returns true for stock events.
    pub fn is_stock_event(&self) -> bool {
        self.as_topic().starts_with("stock.")
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_topic())
    }
}

/// The service identity an event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventSource {
    #[serde(rename = "order-service")]
    OrderService,
    #[serde(rename = "inventory-service")]
    InventoryService,
    #[serde(rename = "tracking-service")]
    TrackingService,
}

impl EventSource {
    /// Returns the service name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSource::OrderService => "order-service",
            EventSource::InventoryService => "inventory-service",
            EventSource::TrackingService => "tracking-service",
        }
    }
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable entry in the tracking log.
///
/// Appended once, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Unique identifier of this log entry.
    pub id: Uuid,

    /// The kind of domain event recorded.
    pub event_type: EventType,

    /// The service the event originated from.
    pub event_source: EventSource,

    /// The order this event belongs to.
    pub order_id: OrderId,

    /// The event's wire payload, stored opaquely.
    pub payload: serde_json::Value,

    /// Recording metadata, enriched with `recordedAt` and `schemaVersion`.
    pub metadata: HashMap<String, serde_json::Value>,

    /// When the event occurred.
    pub timestamp: DateTime<Utc>,

    /// Correlation key; defaults to the order ID.
    pub correlation_id: String,
}

impl TrackingEvent {
    /// Records a new event with enriched metadata.
    pub fn record(
        event_type: EventType,
        event_source: EventSource,
        order_id: OrderId,
        payload: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        let mut metadata = HashMap::new();
        metadata.insert(
            "recordedAt".to_string(),
            serde_json::Value::String(now.to_rfc3339()),
        );
        metadata.insert(
            "schemaVersion".to_string(),
            serde_json::Value::String(SCHEMA_VERSION.to_string()),
        );

        Self {
            id: Uuid::new_v4(),
            event_type,
            event_source,
            order_id,
            payload,
            metadata,
            timestamp: now,
            correlation_id: order_id.to_string(),
        }
    }

    /// Overrides the correlation key.
    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_mapping_roundtrip() {
        for topic in bus::topics::ALL {
            let event_type = EventType::from_topic(topic).unwrap();
            assert_eq!(event_type.as_topic(), topic);
        }
    }

    #[test]
    fn test_unknown_topic_is_rejected() {
        assert!(EventType::from_topic("payment.captured").is_none());
    }

    #[test]
    fn test_source_follows_topic_family() {
        assert_eq!(
            EventType::OrderConfirmed.source(),
            EventSource::OrderService
        );
        assert_eq!(
            EventType::StockReserved.source(),
            EventSource::InventoryService
        );
    }

    #[test]
    fn test_event_family_predicates() {
        assert!(EventType::OrderFailed.is_order_event());
        assert!(!EventType::OrderFailed.is_stock_event());
        assert!(EventType::StockReleased.is_stock_event());
    }

    #[test]
    fn test_record_enriches_metadata_and_defaults_correlation() {
        let order_id = OrderId::new();
        let event = TrackingEvent::record(
            EventType::OrderInitiated,
            EventSource::OrderService,
            order_id,
            serde_json::json!({"orderId": order_id}),
        );

        assert!(event.metadata.contains_key("recordedAt"));
        assert_eq!(
            event.metadata["schemaVersion"],
            serde_json::Value::String("1".to_string())
        );
        assert_eq!(event.correlation_id, order_id.to_string());
    }

    #[test]
    fn test_with_correlation_overrides() {
        let event = TrackingEvent::record(
            EventType::OrderInitiated,
            EventSource::OrderService,
            OrderId::new(),
            serde_json::json!({}),
        )
        .with_correlation("saga-42");
        assert_eq!(event.correlation_id, "saga-42");
    }

    #[test]
    fn test_event_type_serializes_as_topic() {
        let json = serde_json::to_string(&EventType::StockReservationFailed).unwrap();
        assert_eq!(json, "\"stock.reservation.failed\"");
    }
}
