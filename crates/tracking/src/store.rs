//! Tracking persistence seam and query filter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;

use crate::event::{EventSource, EventType, TrackingEvent};
use crate::Result;

/// Filter for querying the tracking log.
///
/// Build with the fluent methods; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to a single order.
    pub order_id: Option<OrderId>,

    /// Restrict to one event type.
    pub event_type: Option<EventType>,

    /// Restrict to one originating service.
    pub event_source: Option<EventSource>,

    /// Only events at or after this time.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Only events at or before this time.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Skip this many matches.
    pub offset: Option<usize>,

    /// Return at most this many matches.
    pub limit: Option<usize>,
}

impl EventFilter {
    /// Creates an empty filter matching all events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by order.
    pub fn order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// Filters by event type.
    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Filters by originating service.
    pub fn event_source(mut self, event_source: EventSource) -> Self {
        self.event_source = Some(event_source);
        self
    }

    /// Filters by earliest timestamp.
    pub fn from_timestamp(mut self, from: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(from);
        self
    }

    /// Filters by latest timestamp.
    pub fn to_timestamp(mut self, to: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(to);
        self
    }

    /// Skips the first `offset` matches.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Caps the number of matches returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the event passes every set criterion.
    pub fn matches(&self, event: &TrackingEvent) -> bool {
        if let Some(order_id) = self.order_id
            && event.order_id != order_id
        {
            return false;
        }
        if let Some(event_type) = self.event_type
            && event.event_type != event_type
        {
            return false;
        }
        if let Some(event_source) = self.event_source
            && event.event_source != event_source
        {
            return false;
        }
        if let Some(from) = self.from_timestamp
            && event.timestamp < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && event.timestamp > to
        {
            return false;
        }
        true
    }
}

/// Store interface for the append-only tracking log.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Appends an event. Events are never updated or deleted.
    async fn append(&self, event: TrackingEvent) -> Result<()>;

    /// Returns all events for an order, oldest first.
    async fn events_for_order(&self, order_id: OrderId) -> Result<Vec<TrackingEvent>>;

    /// Returns events matching the filter, oldest first.
    async fn query(&self, filter: EventFilter) -> Result<Vec<TrackingEvent>>;
}
