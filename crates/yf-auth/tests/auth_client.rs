use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use yf_auth::{AuthClient, AuthError, Role, UserId};
use yf_data::FetchClient;

async fn spawn(app: Router) -> AuthClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let fetch = FetchClient::new()
        .unwrap()
        .with_base_url(format!("http://{}", addr));
    AuthClient::new(fetch)
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == "hunter22" {
        (
            StatusCode::OK,
            Json(json!({
                "user": { "id": 42, "email": body["email"], "name": "Asha", "role": "USER" },
                "token": "tok-42"
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        )
    }
}

async fn register(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] == "taken@example.com" {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Email already registered" })),
        )
    } else {
        (
            StatusCode::OK,
            Json(json!({ "user": { "id": 7, "email": body["email"], "name": body["name"] } })),
        )
    }
}

fn app() -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
}

#[tokio::test]
async fn login_returns_session_with_token() {
    let client = spawn(app()).await;
    let session = client.login("asha@example.com", "hunter22").await.unwrap();

    assert_eq!(session.user_id(), UserId::new(42));
    assert_eq!(session.user.role, Role::Customer);
    assert_eq!(session.credential.token(), Some("tok-42"));
    assert!(session.is_valid());
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let client = spawn(app()).await;
    let err = client.login("asha@example.com", "nope").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn register_without_token() {
    let client = spawn(app()).await;
    let session = client
        .register("Ravi", "ravi@example.com", "secret1")
        .await
        .unwrap();
    assert_eq!(session.user_id(), UserId::new(7));
    assert!(!session.credential.is_present());
}

#[tokio::test]
async fn register_duplicate_email() {
    let client = spawn(app()).await;
    let err = client
        .register("Ravi", "taken@example.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserAlreadyExists(ref e) if e == "taken@example.com"));
}

#[tokio::test]
async fn short_password_rejected_locally() {
    let client = spawn(app()).await;
    let err = client
        .register("Ravi", "ravi@example.com", "123")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));
}
