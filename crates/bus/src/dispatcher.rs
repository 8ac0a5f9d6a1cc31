//! Topic-to-handler dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::bus::EventBus;

/// Outcome a handler reports for a delivery.
///
/// The split drives the acknowledgement policy: business rejections are
/// acknowledged so they are not redelivered forever, infrastructure
/// failures are requeued.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The event cannot be processed and retrying will not help.
    #[error("event rejected: {0}")]
    Rejected(String),

    /// A dependency was unreachable; the delivery should be retried.
    #[error("infrastructure failure: {0}")]
    Infrastructure(String),
}

/// A reactive handler for one or more topics.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one delivery.
    async fn handle(
        &self,
        topic: &str,
        payload: &serde_json::Value,
    ) -> Result<(), HandlerError>;
}

/// Routes topic subscriptions to handler functions.
///
/// Registrations are an explicit (topic, handler) list; each one runs its
/// own consume loop on its own subscription. No discovery mechanism.
pub struct Dispatcher<B: EventBus + 'static> {
    bus: B,
    registrations: Vec<(String, Arc<dyn EventHandler>)>,
}

impl<B: EventBus + 'static> Dispatcher<B> {
    /// Creates a dispatcher over the given bus.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            registrations: Vec::new(),
        }
    }

    /// Registers a handler for a topic.
    pub fn on(mut self, topic: &str, handler: Arc<dyn EventHandler>) -> Self {
        self.registrations.push((topic.to_string(), handler));
        self
    }

    /// Subscribes every registration and spawns its consume loop.
    pub async fn spawn(self) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::with_capacity(self.registrations.len());

        for (topic, handler) in self.registrations {
            let mut rx = self.bus.subscribe(&topic).await;
            tasks.push(tokio::spawn(async move {
                while let Some(delivery) = rx.recv().await {
                    match handler.handle(&delivery.topic, &delivery.payload).await {
                        Ok(()) => delivery.ack(),
                        Err(HandlerError::Rejected(reason)) => {
                            tracing::warn!(%topic, %reason, "event rejected, acknowledging");
                            delivery.ack();
                        }
                        Err(HandlerError::Infrastructure(reason)) => {
                            tracing::error!(%topic, %reason, "handler infrastructure failure, requeueing");
                            delivery.reject(true);
                        }
                    }
                }
            }));
        }

        tasks
    }
}
