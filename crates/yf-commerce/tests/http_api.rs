use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use yf_auth::{Credential, Session, User, UserId};
use yf_commerce::api::{CommerceApi, HttpCommerceApi};
use yf_commerce::checkout::{CheckoutAddress, NewOrder, OrderNumber, OrderStatus, PaymentMethod};
use yf_commerce::config::ApiConfig;
use yf_commerce::error::RemoteErrorKind;
use yf_commerce::ids::{CartRowId, ProductId};
use yf_commerce::money::Money;

async fn spawn(app: Router) -> HttpCommerceApi {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let config = ApiConfig {
        base_url: format!("http://{}", addr),
        records_key: Some("anon-key".into()),
        ..ApiConfig::default()
    };
    HttpCommerceApi::new(&config).unwrap()
}

fn session() -> Session {
    Session::new(User::new(UserId::new(42), "asha@example.com"), Credential::bearer("tok-42"))
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn cart(Path(user): Path<u64>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if header(&headers, "authorization") != "Bearer tok-42" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" })));
    }
    assert_eq!(user, 42);
    (
        StatusCode::OK,
        Json(json!([
            { "id": 1, "quantity": 1, "product": { "id": 1, "name": "Canvas Buddha Painting", "price": 2499, "discount": 0, "imageUrl": "buddha.jpg", "category": "Wall Art" } },
            { "id": 2, "quantity": 2, "product": { "id": 4, "name": "Brass Diya Set", "price": 1499, "discount": 200, "imageUrl": "diya.jpg" } }
        ])),
    )
}

async fn add_wishlist(Path(product): Path<u64>) -> (StatusCode, Json<Value>) {
    if product == 7 {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Product already in wishlist" })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({ "id": 9, "product": { "id": product, "name": "Lamp", "price": 1000, "discount": 100 } })),
        )
    }
}

async fn insert_order(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    assert_eq!(header(&headers, "apikey"), "anon-key");
    assert_eq!(header(&headers, "prefer"), "return=representation");
    assert_eq!(body["user_id"], 42);
    assert_eq!(body["status"], "pending");
    (
        StatusCode::CREATED,
        Json(json!([{
            "id": 501,
            "order_number": body["order_number"],
            "status": "pending",
            "total_amount": body["total_amount"],
            "created_at": "2026-10-16T09:30:00.000+00:00"
        }])),
    )
}

async fn list_orders(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("user_id").map(String::as_str), Some("eq.42"));
    assert_eq!(params.get("order").map(String::as_str), Some("created_at.desc"));
    assert_eq!(params.get("limit").map(String::as_str), Some("10"));
    Json(json!([
        { "id": 2, "order_number": "YFB2", "status": "shipped", "total_amount": 599, "created_at": "2026-10-15T10:00:00Z" },
        { "id": 1, "order_number": "YFA1", "status": "delivered", "total_amount": 5097.5, "created_at": "2026-10-01T10:00:00Z" }
    ]))
}

async fn clear_cart(Query(params): Query<HashMap<String, String>>) -> StatusCode {
    assert_eq!(params.get("user_id").map(String::as_str), Some("eq.42"));
    StatusCode::NO_CONTENT
}

fn app() -> Router {
    Router::new()
        .route("/api/cart/{user}", get(cart))
        .route("/api/wishlist/{product}", post(add_wishlist))
        .route("/rest/v1/orders", post(insert_order).get(list_orders))
        .route("/rest/v1/cart_items", delete(clear_cart))
}

#[tokio::test]
async fn fetch_cart_maps_rows_and_sends_token() {
    let api = spawn(app()).await;
    let lines = api.fetch_cart(&session()).await.unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].category, "Wall Art");
    assert_eq!(lines[1].unit_price, Money::from_rupees(1299));
    assert_eq!(lines[1].original_price, Some(Money::from_rupees(1499)));
    assert_eq!(lines[1].remote_id, Some(CartRowId::new(2)));
    assert_eq!(lines[1].category, "General");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let api = spawn(app()).await;
    let anonymous = Session::new(User::new(UserId::new(42), "asha@example.com"), Credential::none());
    let err = api.fetch_cart(&anonymous).await.unwrap_err();
    assert_eq!(err.kind, RemoteErrorKind::Unauthorized);
}

#[tokio::test]
async fn duplicate_wishlist_add_is_conflict() {
    let api = spawn(app()).await;
    let err = api.add_wishlist(&session(), ProductId::new(7)).await.unwrap_err();
    assert!(err.is_conflict());

    let entry = api.add_wishlist(&session(), ProductId::new(8)).await.unwrap();
    assert_eq!(entry.product_id, ProductId::new(8));
    assert_eq!(entry.product.discount_percent, 10);
}

#[tokio::test]
async fn create_order_returns_inserted_row() {
    let api = spawn(app()).await;
    let order = NewOrder {
        order_number: OrderNumber::generate(),
        status: OrderStatus::Pending,
        total_amount: Money::from_rupees(599),
        shipping_address: CheckoutAddress::default(),
        payment_method: PaymentMethod::CashOnDelivery,
    };
    let summary = api.create_order(&session(), &order).await.unwrap();

    assert_eq!(summary.id.get(), 501);
    assert_eq!(summary.order_number, order.order_number);
    assert_eq!(summary.total_amount, Money::from_rupees(599));
    assert!(summary.created_at.is_some());
}

#[tokio::test]
async fn list_orders_queries_newest_first() {
    let api = spawn(app()).await;
    let orders = api.list_orders(&session(), 10).await.unwrap();

    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].status, OrderStatus::Shipped);
    assert_eq!(orders[1].total_amount, Money::from_paise(509_750));
}

#[tokio::test]
async fn clear_cart_deletes_user_rows() {
    let api = spawn(app()).await;
    api.clear_cart(&session()).await.unwrap();
}
