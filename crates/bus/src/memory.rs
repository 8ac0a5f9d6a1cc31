//! In-memory event bus.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::bus::{Delivery, EventBus};
use crate::error::Result;

type Subscribers = Arc<RwLock<HashMap<String, Vec<mpsc::UnboundedSender<Delivery>>>>>;

/// In-memory bus with topic routing and at-least-once redelivery.
///
/// Rejected-with-requeue messages flow back through an internal channel and
/// are re-routed to the topic's subscribers by a background pump, matching
/// broker semantics closely enough for single-process deployments and tests.
/// Must be created inside a tokio runtime.
#[derive(Clone)]
pub struct InMemoryBus {
    subscribers: Subscribers,
    redeliver_tx: mpsc::UnboundedSender<(String, serde_json::Value)>,
}

impl InMemoryBus {
    /// Creates a new bus and starts its redelivery pump.
    pub fn new() -> Self {
        let subscribers: Subscribers = Arc::new(RwLock::new(HashMap::new()));
        let (redeliver_tx, mut redeliver_rx) =
            mpsc::unbounded_channel::<(String, serde_json::Value)>();

        let pump_subscribers = subscribers.clone();
        let pump_redeliver = redeliver_tx.clone();
        tokio::spawn(async move {
            while let Some((topic, payload)) = redeliver_rx.recv().await {
                tracing::debug!(%topic, "redelivering message");
                route(&pump_subscribers, &pump_redeliver, &topic, payload).await;
            }
        });

        Self {
            subscribers,
            redeliver_tx,
        }
    }

    /// Returns the number of live subscriptions for a topic.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(topic)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

async fn route(
    subscribers: &Subscribers,
    redeliver: &mpsc::UnboundedSender<(String, serde_json::Value)>,
    topic: &str,
    payload: serde_json::Value,
) {
    let mut subs = subscribers.write().await;
    if let Some(topic_subs) = subs.get_mut(topic) {
        topic_subs.retain(|tx| {
            tx.send(Delivery {
                topic: topic.to_string(),
                payload: payload.clone(),
                redeliver: Some(redeliver.clone()),
            })
            .is_ok()
        });
    }
}

#[async_trait]
impl EventBus for InMemoryBus {
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> Result<()> {
        tracing::debug!(%topic, "publishing message");
        route(&self.subscribers, &self.redeliver_tx, topic, payload).await;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> mpsc::UnboundedReceiver<Delivery> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        rx
    }
}
