//! Error types for remote operations.

use thiserror::Error;

/// Errors surfaced by the todo query/mutation layer.
///
/// None of these are fatal: the caller renders a failure state and the user
/// may retry with a fresh intent. Nothing is retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// No active session; the call was never attempted.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The backend rejected the call. The message is passed through as-is.
    #[error("{0}")]
    Remote(String),

    /// The call could not be completed (connection, timeout, malformed response).
    #[error("Network error: {0}")]
    Network(String),
}

impl TodoError {
    /// Returns true for the missing-session precondition failure
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated)
    }
}

/// Errors surfaced by sign-in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The auth collaborator rejected the credentials.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The auth collaborator could not be reached or answered unexpectedly.
    #[error("Network error: {0}")]
    Network(String),
}
