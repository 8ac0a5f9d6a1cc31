//! Integration tests for the gateway.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use inventory::LockingStrategy;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

async fn setup(strategy: LockingStrategy) -> (axum::Router, Arc<gateway::AppState>) {
    let (state, _tasks) = gateway::create_default_state(strategy).await;
    let app = gateway::create_app(state.clone(), get_metrics_handle());
    (app, state)
}

async fn post_json(
    app: &axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn seed(app: &axum::Router, sku: &str, quantity: u32, price: i64) {
    let (status, _) = post_json(
        app,
        "/inventory",
        serde_json::json!({
            "productId": sku,
            "productName": format!("Product {sku}"),
            "quantity": quantity,
            "price": price,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn wait_for_order_status(app: &axum::Router, order_id: &str, expected: &str) {
    for _ in 0..200 {
        let (status, body) = get_json(app, &format!("/orders/{order_id}")).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("order {order_id} never reached {expected}");
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup(LockingStrategy::Pessimistic).await;

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_flows_to_confirmed() {
    let (app, _) = setup(LockingStrategy::Pessimistic).await;
    seed(&app, "SKU-001", 5, 1000).await;
    seed(&app, "SKU-002", 3, 2500).await;

    let (status, body) = post_json(
        &app,
        "/orders",
        serde_json::json!({
            "items": [
                {"productId": "SKU-001", "quantity": 2},
                {"productId": "SKU-002", "quantity": 1}
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "PENDING");

    let order_id = body["orderId"].as_str().unwrap().to_string();
    wait_for_order_status(&app, &order_id, "CONFIRMED").await;

    let (_, order) = get_json(&app, &format!("/orders/{order_id}")).await;
    assert_eq!(order["totalAmount"], 4500);
    assert_eq!(order["items"][0]["productName"], "Product SKU-001");

    let (_, record) = get_json(&app, "/inventory/SKU-001").await;
    assert_eq!(record["availableQuantity"], 3);
    assert_eq!(record["reservedQuantity"], 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_order_fails_when_stock_is_short() {
    let (app, _) = setup(LockingStrategy::Optimistic).await;
    seed(&app, "SKU-001", 1, 1000).await;

    let (status, body) = post_json(
        &app,
        "/orders",
        serde_json::json!({"items": [{"productId": "SKU-001", "quantity": 5}]}),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let order_id = body["orderId"].as_str().unwrap().to_string();
    wait_for_order_status(&app, &order_id, "FAILED").await;

    let (_, record) = get_json(&app, "/inventory/SKU-001").await;
    assert_eq!(record["availableQuantity"], 1);
    assert_eq!(record["reservedQuantity"], 0);
}

#[tokio::test]
async fn test_direct_reserve_maps_errors_to_statuses() {
    let (app, _) = setup(LockingStrategy::Pessimistic).await;
    seed(&app, "SKU-001", 1, 1000).await;

    // Success
    let (status, record) = post_json(
        &app,
        "/inventory/reserve",
        serde_json::json!({"productId": "SKU-001", "quantity": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["availableQuantity"], 0);
    assert_eq!(record["status"], "OUT_OF_STOCK");

    // Insufficient stock → conflict
    let (status, _) = post_json(
        &app,
        "/inventory/reserve",
        serde_json::json!({"productId": "SKU-001", "quantity": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Unknown product → not found
    let (status, _) = post_json(
        &app,
        "/inventory/reserve",
        serde_json::json!({"productId": "SKU-404", "quantity": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Release puts the unit back
    let (status, record) = post_json(
        &app,
        "/inventory/release",
        serde_json::json!({"productId": "SKU-001", "quantity": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["availableQuantity"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_confirmed_order_and_tracking_timeline() {
    let (app, _) = setup(LockingStrategy::Application).await;
    seed(&app, "SKU-001", 5, 1000).await;

    let (_, body) = post_json(
        &app,
        "/orders",
        serde_json::json!({"items": [{"productId": "SKU-001", "quantity": 2}]}),
    )
    .await;
    let order_id = body["orderId"].as_str().unwrap().to_string();
    wait_for_order_status(&app, &order_id, "CONFIRMED").await;

    let (status, cancelled) = post_json(
        &app,
        &format!("/orders/{order_id}/cancel"),
        serde_json::json!({"reason": "changed mind"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    // The timeline eventually records the whole story.
    let mut topics: Vec<String> = Vec::new();
    for _ in 0..200 {
        let (_, events) = get_json(&app, &format!("/tracking/orders/{order_id}")).await;
        topics = events
            .as_array()
            .unwrap()
            .iter()
            .map(|event| event["eventType"].as_str().unwrap().to_string())
            .collect();
        if topics.contains(&"stock.released".to_string()) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for expected in [
        "order.initiated",
        "stock.reserved",
        "order.created",
        "order.confirmed",
        "order.cancelled",
        "stock.released",
    ] {
        assert!(
            topics.contains(&expected.to_string()),
            "timeline missing {expected}: {topics:?}"
        );
    }
}

#[tokio::test]
async fn test_cancel_unknown_order_is_not_found() {
    let (app, _) = setup(LockingStrategy::Pessimistic).await;

    let (status, _) = post_json(
        &app,
        &format!("/orders/{}/cancel", uuid::Uuid::new_v4()),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tracking_events_filter_by_type() {
    let (app, _) = setup(LockingStrategy::Pessimistic).await;
    seed(&app, "SKU-001", 5, 1000).await;

    let (_, body) = post_json(
        &app,
        "/orders",
        serde_json::json!({"items": [{"productId": "SKU-001", "quantity": 1}]}),
    )
    .await;
    let order_id = body["orderId"].as_str().unwrap().to_string();
    wait_for_order_status(&app, &order_id, "CONFIRMED").await;

    let mut confirmed = serde_json::Value::Null;
    for _ in 0..200 {
        let (_, events) = get_json(&app, "/tracking/events?eventType=order.confirmed").await;
        if !events.as_array().unwrap().is_empty() {
            confirmed = events;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let events = confirmed.as_array().expect("no confirmed events recorded");
    assert!(events
        .iter()
        .all(|event| event["eventType"] == "order.confirmed"));

    let (status, _) = get_json(&app, "/tracking/events?eventType=payment.captured").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_in_order_is_accepted_then_failed() {
    let (app, _) = setup(LockingStrategy::Pessimistic).await;

    let (status, body) = post_json(
        &app,
        "/orders",
        serde_json::json!({"items": [{"productId": "SKU-404", "quantity": 1}]}),
    )
    .await;
    // The gateway answers immediately; failure arrives asynchronously.
    assert_eq!(status, StatusCode::ACCEPTED);

    let order_id = body["orderId"].as_str().unwrap().to_string();
    wait_for_order_status(&app, &order_id, "FAILED").await;
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let (app, _) = setup(LockingStrategy::Pessimistic).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
