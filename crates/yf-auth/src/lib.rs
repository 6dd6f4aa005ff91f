//! Identity for the YF storefront client.
//!
//! Provides the signed-in user, the session that carries it between
//! invocations, and the client for the backend's sign-in endpoints.

mod client;
mod error;
mod session;
mod user;

pub use client::AuthClient;
pub use error::AuthError;
pub use session::{Credential, FileSessionStore, Session, SessionSource, StaticSession};
pub use user::{Role, User, UserId};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{AuthError, Session, SessionSource, User, UserId};
}
