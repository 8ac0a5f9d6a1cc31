//! In-memory tracking store.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use tokio::sync::RwLock;

use crate::event::TrackingEvent;
use crate::store::{EventFilter, TrackingStore};
use crate::Result;

/// In-memory append-only tracking store.
#[derive(Clone, Default)]
pub struct InMemoryTrackingStore {
    events: Arc<RwLock<Vec<TrackingEvent>>>,
}

impl InMemoryTrackingStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events recorded.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

#[async_trait]
impl TrackingStore for InMemoryTrackingStore {
    async fn append(&self, event: TrackingEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }

    async fn events_for_order(&self, order_id: OrderId) -> Result<Vec<TrackingEvent>> {
        self.query(EventFilter::new().order_id(order_id)).await
    }

    async fn query(&self, filter: EventFilter) -> Result<Vec<TrackingEvent>> {
        let events = self.events.read().await;
        let mut matches: Vec<TrackingEvent> = events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();

        matches.sort_by_key(|event| event.timestamp);

        let offset = filter.offset.unwrap_or(0);
        let matches: Vec<_> = matches.into_iter().skip(offset).collect();

        Ok(if let Some(limit) = filter.limit {
            matches.into_iter().take(limit).collect()
        } else {
            matches
        })
    }
}
