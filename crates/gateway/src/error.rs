//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use choreography::ChoreographyError;
use inventory::InventoryError;
use orders::OrderError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Choreography command error.
    Choreography(ChoreographyError),
    /// Reservation engine error.
    Inventory(InventoryError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Choreography(err) => choreography_error_to_response(err),
            ApiError::Inventory(err) => inventory_error_to_response(&err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn choreography_error_to_response(err: ChoreographyError) -> (StatusCode, String) {
    match &err {
        ChoreographyError::Order(order_err) => match order_err {
            OrderError::InvalidStatus { .. } => (StatusCode::CONFLICT, err.to_string()),
            OrderError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
            OrderError::InvalidItem(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            OrderError::Infrastructure(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        },
        ChoreographyError::Inventory(inv_err) => inventory_error_to_response(inv_err),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn inventory_error_to_response(err: &InventoryError) -> (StatusCode, String) {
    match err {
        InventoryError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        InventoryError::InsufficientStock { .. } | InventoryError::ConcurrencyConflict { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        InventoryError::Infrastructure(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

impl From<ChoreographyError> for ApiError {
    fn from(err: ChoreographyError) -> Self {
        ApiError::Choreography(err)
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}
