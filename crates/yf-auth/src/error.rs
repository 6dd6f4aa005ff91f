//! Authentication errors.

use thiserror::Error;
use yf_data::FetchError;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid credentials provided.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    /// Input rejected before reaching the server.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Session expired.
    #[error("session expired")]
    SessionExpired,

    /// Session file could not be read or written.
    #[error("session storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The auth endpoint failed.
    #[error("auth request failed: {0}")]
    Remote(#[from] FetchError),
}

impl AuthError {
    /// Check if this is an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            AuthError::InvalidCredentials | AuthError::SessionExpired => true,
            AuthError::Remote(e) => e.is_auth_failure(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(e: std::io::Error) -> Self {
        AuthError::Storage(e.to_string())
    }
}
