//! Tracking log query endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use common::OrderId;
use serde::{Deserialize, Serialize};
use tracking::{EventFilter, EventSource, EventType, TrackingEvent, TrackingStore};

use crate::error::ApiError;
use crate::AppState;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventQueryParams {
    pub order_id: Option<String>,
    pub event_type: Option<String>,
    pub event_source: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEventResponse {
    pub id: String,
    pub event_type: String,
    pub event_source: String,
    pub order_id: String,
    pub payload: serde_json::Value,
    pub metadata: serde_json::Value,
    pub timestamp: String,
    pub correlation_id: String,
}

impl From<TrackingEvent> for TrackingEventResponse {
    fn from(event: TrackingEvent) -> Self {
        TrackingEventResponse {
            id: event.id.to_string(),
            event_type: event.event_type.to_string(),
            event_source: event.event_source.to_string(),
            order_id: event.order_id.to_string(),
            payload: event.payload,
            metadata: serde_json::to_value(event.metadata).unwrap_or_default(),
            timestamp: event.timestamp.to_rfc3339(),
            correlation_id: event.correlation_id,
        }
    }
}

/// GET /tracking/orders/:id — full event timeline for an order.
#[tracing::instrument(skip(state))]
pub async fn timeline(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TrackingEventResponse>>, ApiError> {
    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID: {e}")))?;

    let events = state
        .tracking
        .events_for_order(OrderId::from(uuid))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// GET /tracking/events — filtered event listing.
#[tracing::instrument(skip(state, params))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventQueryParams>,
) -> Result<Json<Vec<TrackingEventResponse>>, ApiError> {
    let mut filter = EventFilter::new();

    if let Some(ref raw) = params.order_id {
        let uuid = uuid::Uuid::parse_str(raw)
            .map_err(|e| ApiError::BadRequest(format!("Invalid orderId: {e}")))?;
        filter = filter.order_id(OrderId::from(uuid));
    }
    if let Some(ref raw) = params.event_type {
        let event_type = EventType::from_topic(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown event type: {raw}")))?;
        filter = filter.event_type(event_type);
    }
    if let Some(ref raw) = params.event_source {
        let event_source = parse_source(raw)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown event source: {raw}")))?;
        filter = filter.event_source(event_source);
    }
    if let Some(offset) = params.offset {
        filter = filter.offset(offset);
    }
    if let Some(limit) = params.limit {
        filter = filter.limit(limit);
    }

    let events = state
        .tracking
        .query(filter)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}

fn parse_source(raw: &str) -> Option<EventSource> {
    match raw {
        "order-service" => Some(EventSource::OrderService),
        "inventory-service" => Some(EventSource::InventoryService),
        "tracking-service" => Some(EventSource::TrackingService),
        _ => None,
    }
}
