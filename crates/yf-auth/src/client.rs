//! Sign-in and registration against the storefront backend.

use crate::session::{Credential, Session};
use crate::user::User;
use crate::AuthError;
use serde::{Deserialize, Serialize};
use yf_data::{FetchClient, FetchError};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// `{ "user": {...}, "token": "..." }`, or a bare user object.
#[derive(Deserialize)]
#[serde(untagged)]
enum AuthResponse {
    Wrapped {
        user: User,
        #[serde(default)]
        token: Option<String>,
    },
    Bare(User),
}

impl AuthResponse {
    fn into_session(self) -> Session {
        match self {
            AuthResponse::Wrapped { user, token } => Session::new(
                user,
                token.map(Credential::bearer).unwrap_or_default(),
            ),
            AuthResponse::Bare(user) => Session::new(user, Credential::none()),
        }
    }
}

/// Client for `/api/auth/*`.
#[derive(Debug, Clone)]
pub struct AuthClient {
    fetch: FetchClient,
}

impl AuthClient {
    /// Create an auth client over an existing fetch client.
    pub fn new(fetch: FetchClient) -> Self {
        Self { fetch }
    }

    /// Sign in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "email and password are required".into(),
            ));
        }

        let resp: AuthResponse = self
            .fetch
            .post("/api/auth/login")
            .json(&LoginRequest { email, password })?
            .send_json()
            .await
            .map_err(|e| match e.status() {
                Some(401) => AuthError::InvalidCredentials,
                _ => AuthError::Remote(e),
            })?;

        let session = resp.into_session();
        tracing::info!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// Create an account and sign in as it.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(AuthError::InvalidInput("enter a valid email".into()));
        }
        if password.len() < 6 {
            return Err(AuthError::InvalidInput(
                "password must be at least 6 characters".into(),
            ));
        }

        let resp: AuthResponse = self
            .fetch
            .post("/api/auth/register")
            .json(&RegisterRequest {
                name: name.trim(),
                email,
                password,
            })?
            .send_json()
            .await
            .map_err(|e| match &e {
                FetchError::HttpError { message, .. }
                    if message.to_ascii_lowercase().contains("already registered") =>
                {
                    AuthError::UserAlreadyExists(email.to_string())
                }
                _ => AuthError::Remote(e),
            })?;

        let session = resp.into_session();
        tracing::info!(user_id = %session.user.id, "registered");
        Ok(session)
    }
}
