//! Commerce error types.

use crate::checkout::{AddressField, PaymentMethod, SubmissionStep};
use crate::ids::LineItemId;
use std::fmt;
use thiserror::Error;
use yf_data::FetchError;

/// Errors that can occur in commerce operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommerceError {
    /// One or more address fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A remote call failed.
    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),

    /// A checkout sub-step failed after an earlier one succeeded.
    #[error(
        "Order {order_number} failed at {step} after the order record was created \
         (compensated: {compensated}): {cause}"
    )]
    PartialSubmission {
        order_number: String,
        step: SubmissionStep,
        compensated: bool,
        cause: RemoteError,
    },

    /// The checkout state machine does not allow this action in its current state.
    #[error("Cannot {action} while checkout is {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    /// The cart no longer matches an order record already on the server.
    #[error(
        "Cart changed after order {order_number} was created; \
         finish or cancel that order before checking out again"
    )]
    CartChanged { order_number: String },

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A server-backed operation was attempted without a signed-in user.
    #[error("Sign in required")]
    NotSignedIn,

    /// The selected payment method is not available yet.
    #[error("Payment method not available: {0}")]
    PaymentMethodUnavailable(PaymentMethod),

    /// The line only exists locally, so the server has nothing to update.
    #[error("Cart line {0} has not been saved to the server")]
    LineNotSynced(LineItemId),
}

impl CommerceError {
    /// Check if this error blocks a transition but leaves everything retryable.
    pub fn is_validation(&self) -> bool {
        matches!(self, CommerceError::Validation(_))
    }

    /// The remote failure underneath this error, if any.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            CommerceError::Remote(e) => Some(e),
            CommerceError::PartialSubmission { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Broad classes of remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// Connection could not be made or was dropped.
    Network,
    /// The request timed out.
    Timeout,
    /// Missing or rejected credentials.
    Unauthorized,
    /// The resource does not exist.
    NotFound,
    /// The resource already exists.
    Conflict,
    /// The server refused the request as invalid.
    Rejected,
    /// The server failed.
    Server,
    /// The response could not be decoded.
    Decode,
}

impl RemoteErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteErrorKind::Network => "network",
            RemoteErrorKind::Timeout => "timeout",
            RemoteErrorKind::Unauthorized => "unauthorized",
            RemoteErrorKind::NotFound => "not_found",
            RemoteErrorKind::Conflict => "conflict",
            RemoteErrorKind::Rejected => "rejected",
            RemoteErrorKind::Server => "server",
            RemoteErrorKind::Decode => "decode",
        }
    }
}

/// A human-readable remote failure, kept by stores for the UI to surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    /// Create a remote error.
    pub fn new(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Server-side failure.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Server, message)
    }

    /// Network failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Network, message)
    }

    /// Check if the resource already existed.
    pub fn is_conflict(&self) -> bool {
        self.kind == RemoteErrorKind::Conflict
    }
}

impl From<FetchError> for RemoteError {
    fn from(e: FetchError) -> Self {
        let kind = match &e {
            FetchError::Timeout(_) => RemoteErrorKind::Timeout,
            FetchError::Connection(_) | FetchError::RequestError(_) | FetchError::InvalidUrl(_) => {
                RemoteErrorKind::Network
            }
            FetchError::ParseError(_) | FetchError::JsonError(_) => RemoteErrorKind::Decode,
            FetchError::HttpError { status, message } => match status {
                401 | 403 => RemoteErrorKind::Unauthorized,
                404 => RemoteErrorKind::NotFound,
                409 => RemoteErrorKind::Conflict,
                400..=499 if message.to_ascii_lowercase().contains("already") => {
                    RemoteErrorKind::Conflict
                }
                400..=499 => RemoteErrorKind::Rejected,
                _ => RemoteErrorKind::Server,
            },
        };
        let message = match e {
            FetchError::HttpError { message, .. } => message,
            other => other.to_string(),
        };
        Self { kind, message }
    }
}

/// A single failed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: AddressField,
    pub message: &'static str,
}

/// Per-field validation messages, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// No errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for a field.
    pub fn push(&mut self, field: AddressField, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    /// Check if every field passed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failed fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The message for a field, if it failed.
    pub fn get(&self, field: AddressField) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }

    /// Iterate failures in form order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for CommerceError {
    fn from(e: ValidationErrors) -> Self {
        CommerceError::Validation(e)
    }
}

impl From<FetchError> for CommerceError {
    fn from(e: FetchError) -> Self {
        CommerceError::Remote(e.into())
    }
}
