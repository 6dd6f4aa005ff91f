//! Session management.
//!
//! A [`Session`] is the identity every server-backed commerce operation
//! needs. Sessions are persisted between CLI invocations by
//! [`FileSessionStore`]; engines and tests that don't touch disk use
//! [`StaticSession`].

use crate::user::{User, UserId};
use crate::AuthError;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Bearer credential issued by the backend, if it issued one.
///
/// The backend may authenticate purely by user id, in which case no token
/// is sent. The token never appears in `Debug` output.
#[derive(Clone, Default)]
pub struct Credential(Option<SecretString>);

impl Credential {
    /// Credential carrying a bearer token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self(Some(SecretString::from(token.into())))
    }

    /// No token; requests are identified by user id alone.
    pub fn none() -> Self {
        Self(None)
    }

    /// Expose the token for an outgoing `Authorization` header.
    pub fn token(&self) -> Option<&str> {
        self.0.as_ref().map(|s| s.expose_secret())
    }

    /// Check whether a token is present.
    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential([REDACTED])"),
            None => f.write_str("Credential(None)"),
        }
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.token() == other.token()
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.token().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map(Credential::bearer)
            .unwrap_or_default())
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in user.
    pub user: User,
    /// Credential to attach to requests.
    #[serde(default)]
    pub credential: Credential,
    /// When the session stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Default session duration: 7 days.
    pub const DEFAULT_DURATION_DAYS: i64 = 7;

    /// Create a session that expires after the default duration.
    pub fn new(user: User, credential: Credential) -> Self {
        Self {
            user,
            credential,
            expires_at: Utc::now() + Duration::days(Self::DEFAULT_DURATION_DAYS),
        }
    }

    /// Override the expiry.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// The signed-in user's id.
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    /// Check if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the session is still valid.
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

/// Anything that can answer "who is signed in right now".
pub trait SessionSource: Send + Sync {
    /// The current valid session, or `None` when signed out.
    fn current(&self) -> Option<Session>;
}

/// An in-memory session holder.
#[derive(Debug, Default)]
pub struct StaticSession {
    inner: RwLock<Option<Session>>,
}

impl StaticSession {
    /// Holder with a signed-in session.
    pub fn signed_in(session: Session) -> Self {
        Self {
            inner: RwLock::new(Some(session)),
        }
    }

    /// Holder with nobody signed in.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Replace the held session.
    pub fn set(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = session;
        }
    }
}

impl SessionSource for StaticSession {
    fn current(&self) -> Option<Session> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(Session::is_valid)
    }
}

/// Persists a session as JSON on disk.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session.
    ///
    /// A missing file or an expired session both yield `Ok(None)`.
    pub fn load(&self) -> Result<Option<Session>, AuthError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: Session = serde_json::from_str(&raw)?;
        if session.is_expired() {
            tracing::debug!(user_id = %session.user.id, "saved session expired");
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Save a session, creating parent directories as needed.
    pub fn save(&self, session: &Session) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), user_id = %session.user.id, "session saved");
        Ok(())
    }

    /// Remove the saved session. Removing a missing file is not an error.
    pub fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionSource for FileSessionStore {
    fn current(&self) -> Option<Session> {
        match self.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "unreadable session file");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(UserId::new(42), "asha@example.com").with_name("Asha")
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "yf-auth-{}-{}-{}.json",
            name,
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[test]
    fn test_new_session_is_valid() {
        let session = Session::new(user(), Credential::none());
        assert!(session.is_valid());
        assert_eq!(session.user_id(), UserId::new(42));
    }

    #[test]
    fn test_expired_session() {
        let session = Session::new(user(), Credential::none())
            .with_expiry(Utc::now() - Duration::seconds(1));
        assert!(session.is_expired());
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::bearer("super-secret");
        let shown = format!("{:?}", cred);
        assert!(!shown.contains("super-secret"));
        assert_eq!(cred.token(), Some("super-secret"));
    }

    #[test]
    fn test_static_session_hides_expired() {
        let expired = Session::new(user(), Credential::none())
            .with_expiry(Utc::now() - Duration::seconds(1));
        let source = StaticSession::signed_in(expired);
        assert!(source.current().is_none());

        source.set(Some(Session::new(user(), Credential::none())));
        assert_eq!(source.current().map(|s| s.user_id()), Some(UserId::new(42)));

        source.set(None);
        assert!(source.current().is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let store = FileSessionStore::new(temp_path("roundtrip"));
        assert!(store.load().unwrap().is_none());

        let session = Session::new(user(), Credential::bearer("tok"));
        store.save(&session).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, session);
        assert_eq!(loaded.credential.token(), Some("tok"));

        store.clear().unwrap();
        assert!(store.current().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_drops_expired() {
        let store = FileSessionStore::new(temp_path("expired"));
        let session = Session::new(user(), Credential::none())
            .with_expiry(Utc::now() - Duration::hours(1));
        store.save(&session).unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }
}
