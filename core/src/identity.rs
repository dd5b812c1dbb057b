//! Session identity and sign-in credentials.

use serde::{Deserialize, Serialize};

/// Opaque identifier of an authenticated user
///
/// Used to scope ownership of todo records.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from its textual form
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the textual form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated user
///
/// Present only while signed in. Its absence is a valid state in which every
/// remote operation fails fast.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User identifier
    pub id: UserId,
    /// Contact address, if the backend reports one
    pub email: Option<String>,
}

impl Identity {
    /// Creates an identity
    #[must_use]
    pub const fn new(id: UserId, email: Option<String>) -> Self {
        Self { id, email }
    }

    /// Display label: the email when known, otherwise the user id
    #[must_use]
    pub fn label(&self) -> &str {
        self.email.as_deref().unwrap_or_else(|| self.id.as_str())
    }
}

/// Email and password pair for password sign-in
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email
    pub email: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns the password
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
