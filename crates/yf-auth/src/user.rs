//! User identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric user identifier assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Create a new ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Regular customer.
    #[default]
    #[serde(rename = "USER", alias = "user", alias = "customer")]
    Customer,
    /// Store administrator.
    #[serde(rename = "ADMIN", alias = "admin")]
    Admin,
}

impl Role {
    /// Get role as the backend spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" | "CUSTOMER" => Ok(Role::Customer),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// A signed-in user as the backend describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Role, `USER` when the backend omits it.
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Create a new customer identity.
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
            role: Role::Customer,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get display name, falling back to the email address.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.email.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_backend_json() {
        let user: User =
            serde_json::from_str(r#"{"id":42,"name":"Asha","email":"asha@example.com","role":"USER"}"#)
                .unwrap();
        assert_eq!(user.id, UserId::new(42));
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.display_name(), "Asha");
    }

    #[test]
    fn test_missing_role_defaults_to_customer() {
        let user: User = serde_json::from_str(r#"{"id":7,"email":"x@example.com"}"#).unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.display_name(), "x@example.com");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("USER".parse::<Role>(), Ok(Role::Customer));
        assert!("root".parse::<Role>().is_err());
    }
}
