//! Bus-fed recorder appending every domain event to the log.

use std::sync::Arc;

use async_trait::async_trait;
use bus::{Dispatcher, EventBus, EventHandler, HandlerError};
use common::OrderId;

use crate::event::{EventType, TrackingEvent};
use crate::store::TrackingStore;
use crate::TrackingError;

/// Consumes every topic and appends one tracking event per delivery.
///
/// A pure consumer: records failures and successes alike and never emits
/// follow-up events.
pub struct EventRecorder<T: TrackingStore> {
    store: T,
}

impl<T: TrackingStore> EventRecorder<T> {
    /// Creates a recorder over the given store.
    pub fn new(store: T) -> Self {
        Self { store }
    }

    /// Registers this recorder for every known topic.
    pub fn register<B: EventBus + 'static>(self: Arc<Self>, dispatcher: Dispatcher<B>) -> Dispatcher<B>
    where
        T: 'static,
    {
        let mut dispatcher = dispatcher;
        for topic in bus::topics::ALL {
            dispatcher = dispatcher.on(topic, self.clone());
        }
        dispatcher
    }

    async fn record(&self, topic: &str, payload: &serde_json::Value) -> Result<(), TrackingError> {
        let event_type = EventType::from_topic(topic)
            .ok_or_else(|| TrackingError::UnknownTopic(topic.to_string()))?;

        let order_id: OrderId = payload
            .get("orderId")
            .cloned()
            .and_then(|value| serde_json::from_value(value).ok())
            .ok_or_else(|| {
                TrackingError::MalformedPayload(format!("missing orderId on '{topic}'"))
            })?;

        let event = TrackingEvent::record(event_type, event_type.source(), order_id, payload.clone());

        tracing::debug!(%topic, %order_id, "recording tracking event");
        self.store.append(event).await
    }
}

#[async_trait]
impl<T: TrackingStore> EventHandler for EventRecorder<T> {
    async fn handle(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<(), HandlerError> {
        self.record(topic, payload).await.map_err(|err| match err {
            TrackingError::Infrastructure(msg) => HandlerError::Infrastructure(msg),
            other => HandlerError::Rejected(other.to_string()),
        })
    }
}
