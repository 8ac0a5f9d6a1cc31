//! HTTP surface and process wiring for the reservation system.
//!
//! Thin by design: request parsing and response mapping live here, every
//! business decision lives in the core crates. `create_default_state` wires
//! the in-memory deployment (store, engine, repositories, bus, handlers)
//! and spawns the consume loops.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use bus::{Dispatcher, InMemoryBus};
use choreography::{OrderCommands, OrderLifecycleHandler, ReservationLedger, StockReservationHandler};
use inventory::{InMemoryInventoryStore, LockingStrategy, ReservationEngine};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::InMemoryOrderRepository;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracking::{EventRecorder, InMemoryTrackingStore};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub commands: OrderCommands<InMemoryOrderRepository, InMemoryBus>,
    pub engine: Arc<ReservationEngine<InMemoryInventoryStore>>,
    pub tracking: InMemoryTrackingStore,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/inventory", post(routes::inventory::seed))
        .route("/inventory/reserve", post(routes::inventory::reserve))
        .route("/inventory/release", post(routes::inventory::release))
        .route("/inventory/{productId}", get(routes::inventory::get))
        .route("/tracking/orders/{id}", get(routes::tracking::timeline))
        .route("/tracking/events", get(routes::tracking::list))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the in-memory deployment and spawns its consume loops.
///
/// Returns the shared state plus the dispatcher tasks, which run for the
/// life of the process.
pub async fn create_default_state(
    strategy: LockingStrategy,
) -> (Arc<AppState>, Vec<JoinHandle<()>>) {
    let store = InMemoryInventoryStore::new();
    let engine = Arc::new(ReservationEngine::new(store, strategy));
    let bus = InMemoryBus::new();
    let order_repo = InMemoryOrderRepository::new();
    let tracking_store = InMemoryTrackingStore::new();

    let stock_handler = Arc::new(StockReservationHandler::new(
        engine.clone(),
        bus.clone(),
        ReservationLedger::new(),
    ));
    let order_handler = Arc::new(OrderLifecycleHandler::new(order_repo.clone(), bus.clone()));
    let recorder = Arc::new(EventRecorder::new(tracking_store.clone()));

    let dispatcher = Dispatcher::new(bus.clone())
        .on(bus::topics::ORDER_INITIATED, stock_handler.clone())
        .on(bus::topics::ORDER_CANCELLED, stock_handler)
        .on(bus::topics::STOCK_RESERVED, order_handler.clone())
        .on(bus::topics::STOCK_RESERVATION_FAILED, order_handler);
    let tasks = recorder.register(dispatcher).spawn().await;

    let state = Arc::new(AppState {
        commands: OrderCommands::new(order_repo, bus),
        engine,
        tracking: tracking_store,
    });

    (state, tasks)
}
