//! Publish/consume contract.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{BusError, Result};

/// A message handed to a consumer, with its acknowledgement handle.
///
/// Delivery is at-least-once: a message must be either acknowledged or
/// rejected. Rejection may request redelivery (`requeue = true`) or drop
/// the message.
#[derive(Debug)]
pub struct Delivery {
    /// Topic the message was published to.
    pub topic: String,

    /// The wire payload.
    pub payload: serde_json::Value,

    pub(crate) redeliver: Option<mpsc::UnboundedSender<(String, serde_json::Value)>>,
}

impl Delivery {
    /// Acknowledges the message; it will not be delivered again.
    pub fn ack(self) {}

    /// Rejects the message, optionally requesting redelivery.
    pub fn reject(self, requeue: bool) {
        if requeue
            && let Some(redeliver) = self.redeliver
        {
            if redeliver.send((self.topic.clone(), self.payload)).is_err() {
                tracing::warn!(topic = %self.topic, "redelivery channel closed, message dropped");
            }
        }
    }
}

/// Core trait for message bus implementations.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a payload to a topic.
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()>;

    /// Subscribes to a topic, returning a stream of deliveries.
    ///
    /// Every subscriber receives its own copy of each message.
    async fn subscribe(&self, topic: &str) -> mpsc::UnboundedReceiver<Delivery>;
}

/// Extension trait providing convenience methods for event buses.
#[async_trait]
pub trait EventBusExt: EventBus {
    /// Serializes a typed event and publishes it.
    async fn publish_event<T: Serialize + Sync>(&self, topic: &str, event: &T) -> Result<()> {
        let payload = serde_json::to_value(event).map_err(|source| BusError::Encode {
            topic: topic.to_string(),
            source,
        })?;
        self.publish(topic, payload).await
    }
}

// Blanket implementation for all EventBus implementations
impl<T: EventBus + ?Sized> EventBusExt for T {}
