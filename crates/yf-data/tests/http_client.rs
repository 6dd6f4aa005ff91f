//! Drives the real client against an in-process HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use yf_data::{BackoffStrategy, FetchClient, FetchError, RetryPolicy, TimeoutConfig};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn get_json_with_bearer_token() {
    async fn cart(Path(user_id): Path<u64>, headers: HeaderMap) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({ "user": user_id, "auth": auth }))
    }

    let base = spawn(Router::new().route("/api/cart/{user_id}", get(cart))).await;
    let client = FetchClient::new().unwrap().with_base_url(base);

    let body: Value = client
        .get("/api/cart/42")
        .bearer_auth("secret-token")
        .send_json()
        .await
        .unwrap();

    assert_eq!(body["user"], 42);
    assert_eq!(body["auth"], "Bearer secret-token");
}

#[tokio::test]
async fn post_json_body_round_trips() {
    async fn echo(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        (StatusCode::CREATED, Json(json!({ "received": body })))
    }

    let base = spawn(Router::new().route("/api/echo", post(echo))).await;
    let client = FetchClient::new().unwrap().with_base_url(base);

    let body: Value = client
        .post("/api/echo")
        .json(&json!({ "productId": 7, "quantity": 2 }))
        .unwrap()
        .send_json()
        .await
        .unwrap();

    assert_eq!(body["received"]["quantity"], 2);
}

#[tokio::test]
async fn query_parameters_are_sent() {
    async fn filter(Query(params): Query<std::collections::HashMap<String, String>>) -> Json<Value> {
        Json(json!(params))
    }

    let base = spawn(Router::new().route("/rest/v1/cart_items", get(filter))).await;
    let client = FetchClient::new().unwrap().with_base_url(base);

    let body: Value = client
        .get("/rest/v1/cart_items")
        .query("user_id", "eq.42")
        .send_json()
        .await
        .unwrap();

    assert_eq!(body["user_id"], "eq.42");
}

#[tokio::test]
async fn error_status_carries_server_message() {
    async fn missing() -> (StatusCode, Json<Value>) {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Product not found" })),
        )
    }

    let base = spawn(Router::new().route("/api/wishlist/{id}", post(missing))).await;
    let client = FetchClient::new().unwrap().with_base_url(base);

    let err = client.post("/api/wishlist/9").send_empty().await.unwrap_err();
    match err {
        FetchError::HttpError { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Product not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn idempotent_requests_retry_on_server_error() {
    async fn flaky(State(hits): State<Arc<AtomicUsize>>) -> (StatusCode, Json<Value>) {
        if hits.fetch_add(1, Ordering::SeqCst) == 0 {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})))
        } else {
            (StatusCode::OK, Json(json!({ "ok": true })))
        }
    }

    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/api/addresses", get(flaky).post(flaky))
        .with_state(hits.clone());
    let base = spawn(app).await;

    let retry = RetryPolicy::new(2).with_backoff(BackoffStrategy::None);
    let client = FetchClient::with_policy(TimeoutConfig::default(), retry)
        .unwrap()
        .with_base_url(base);

    let body: Value = client.get("/api/addresses").send_json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // POST is never retried: the first 503 surfaces as-is.
    hits.store(0, Ordering::SeqCst);
    let err = client.post("/api/addresses").send_empty().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn slow_responses_time_out() {
    async fn slow() -> Json<Value> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Json(json!({}))
    }

    let base = spawn(Router::new().route("/api/orders", get(slow))).await;
    let timeout = TimeoutConfig::new(Duration::from_millis(100), Duration::from_millis(100));
    let client = FetchClient::with_policy(timeout, RetryPolicy::none())
        .unwrap()
        .with_base_url(base);

    let err = client.get("/api/orders").send().await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)), "got {err:?}");
    assert!(err.is_transport());
}
