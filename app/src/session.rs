//! Session manager: who is signed in.
//!
//! [`SessionState`] is the part of [`AppState`](crate::AppState) that holds
//! the identity; [`SessionManager`] performs the calls against the auth
//! collaborator. Every remote todo operation reads the identity from
//! `SessionState` and refuses to run without one.

use std::sync::Arc;
use todosync_core::{AuthError, AuthProvider, Credentials, Identity};
use tracing::{debug, info, warn};

/// Session part of the application state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<Identity>,
    signing_in: bool,
    error: Option<String>,
}

impl SessionState {
    /// The signed-in identity, if any
    #[must_use]
    pub const fn current_identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns true while a sign-in request is in flight
    #[must_use]
    pub const fn is_signing_in(&self) -> bool {
        self.signing_in
    }

    /// Message of the last failed sign-in
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn begin_sign_in(&mut self) {
        self.signing_in = true;
        self.error = None;
    }

    pub(crate) fn fail_sign_in(&mut self, error: &AuthError) {
        self.signing_in = false;
        self.error = Some(format!("Failed to sign in: {error}"));
    }

    /// Adopt `identity`; returns true when the user changed
    pub(crate) fn set_identity(&mut self, identity: Option<Identity>) -> bool {
        self.signing_in = false;
        if identity.is_some() {
            self.error = None;
        }
        let changed = self.identity.as_ref().map(|i| &i.id) != identity.as_ref().map(|i| &i.id);
        self.identity = identity;
        changed
    }
}

/// Calls against the auth collaborator
///
/// One attempt per explicit user action; nothing is retried.
#[derive(Clone)]
pub struct SessionManager {
    auth: Arc<dyn AuthProvider>,
}

impl SessionManager {
    /// Creates a manager over `auth`
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self { auth }
    }

    /// Exchange credentials for an identity.
    ///
    /// # Errors
    ///
    /// Returns the collaborator's [`AuthError`] unchanged.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        debug!(email = %credentials.email, "Sign-in requested");
        match self.auth.sign_in(credentials).await {
            Ok(identity) => {
                info!(user_id = %identity.id, "Session started");
                Ok(identity)
            },
            Err(error) => {
                info!(%error, "Sign-in rejected");
                Err(error)
            },
        }
    }

    /// End the session. Never fails locally; a failed remote call is logged.
    pub async fn sign_out(&self) {
        match self.auth.sign_out().await {
            Ok(()) => info!("Session ended"),
            Err(error) => warn!(%error, "Remote sign-out failed; local session cleared anyway"),
        }
    }

    /// Ask the collaborator for an already held session.
    pub async fn restore(&self) -> Option<Identity> {
        let identity = self.auth.current_user().await;
        match &identity {
            Some(identity) => info!(user_id = %identity.id, "Session restored"),
            None => debug!("No session to restore"),
        }
        identity
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}
