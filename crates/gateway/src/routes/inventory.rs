//! Inventory seeding and the direct synchronous reservation surface.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use common::{Money, OrderId, ProductId};
use inventory::{InventoryRecord, InventoryStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedInventoryRequest {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub price: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovementRequest {
    pub product_id: String,
    pub quantity: u32,
    pub order_id: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub product_id: String,
    pub product_name: String,
    pub available_quantity: u32,
    pub reserved_quantity: u32,
    pub price: i64,
    pub status: String,
    pub version: u64,
}

impl From<&InventoryRecord> for InventoryResponse {
    fn from(record: &InventoryRecord) -> Self {
        InventoryResponse {
            product_id: record.product_id().to_string(),
            product_name: record.product_name().to_string(),
            available_quantity: record.available(),
            reserved_quantity: record.reserved(),
            price: record.price().cents(),
            status: record.status().to_string(),
            version: record.version().as_u64(),
        }
    }
}

// -- Handlers --

/// POST /inventory — create or replace a stock record.
#[tracing::instrument(skip(state, req))]
pub async fn seed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeedInventoryRequest>,
) -> Result<(StatusCode, Json<InventoryResponse>), ApiError> {
    let record = InventoryRecord::new(
        req.product_id.as_str(),
        req.product_name.as_str(),
        req.quantity,
        Money::from_cents(req.price),
    );

    state.engine.store().insert(record.clone()).await?;

    Ok((StatusCode::CREATED, Json(InventoryResponse::from(&record))))
}

/// GET /inventory/:productId — look up a stock record.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<String>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let record = state
        .engine
        .store()
        .find(&ProductId::new(product_id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {product_id} not found")))?;

    Ok(Json(InventoryResponse::from(&record)))
}

/// POST /inventory/reserve — reserve stock synchronously.
#[tracing::instrument(skip(state, req))]
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StockMovementRequest>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let order_id = parse_order_id(req.order_id.as_deref())?;
    let record = state
        .engine
        .reserve(&ProductId::new(req.product_id.as_str()), req.quantity, order_id)
        .await?;

    Ok(Json(InventoryResponse::from(&record)))
}

/// POST /inventory/release — release reserved stock synchronously.
#[tracing::instrument(skip(state, req))]
pub async fn release(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StockMovementRequest>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let order_id = parse_order_id(req.order_id.as_deref())?;
    let record = state
        .engine
        .release(&ProductId::new(req.product_id.as_str()), req.quantity, order_id)
        .await?;

    Ok(Json(InventoryResponse::from(&record)))
}

fn parse_order_id(raw: Option<&str>) -> Result<OrderId, ApiError> {
    match raw {
        Some(id) => {
            let uuid = uuid::Uuid::parse_str(id)
                .map_err(|e| ApiError::BadRequest(format!("Invalid orderId: {e}")))?;
            Ok(OrderId::from(uuid))
        }
        None => Ok(OrderId::new()),
    }
}
