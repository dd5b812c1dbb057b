//! Supabase HTTP client and the in-memory session it carries.
//!
//! The session is an access token plus, once known, the identity it belongs
//! to. It is filled by a password sign-in or by [`SupabaseClient::restore_token`]
//! and dropped by sign-out or by the auth service rejecting the token.

use crate::config::{ConfigError, SupabaseConfig};
use reqwest::{Client, Method, RequestBuilder};
use std::sync::Arc;
use todosync_core::Identity;
use tokio::sync::RwLock;

/// Session material held between calls.
#[derive(Clone)]
pub(crate) struct Session {
    pub(crate) access_token: String,
    /// `None` for a restored token until the auth service confirms it
    pub(crate) identity: Option<Identity>,
}

/// HTTP client for a Supabase project.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
///
/// # Thread Safety
///
/// The session sits behind a `tokio::sync::RwLock` so concurrent effects
/// may read the token while a sign-out replaces it.
#[derive(Clone)]
pub struct SupabaseClient {
    pub(crate) http: Client,
    pub(crate) config: SupabaseConfig,
    pub(crate) session: Arc<RwLock<Option<Session>>>,
}

impl SupabaseClient {
    /// Creates a client without a session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be created.
    pub fn new(config: SupabaseConfig) -> Result<Self, ConfigError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            config,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// The configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    /// Adopt an access token obtained elsewhere (e.g. a previous run).
    ///
    /// The token is not checked here. The next `current_user` call confirms
    /// it against the auth service and learns the identity, or drops it.
    pub async fn restore_token(&self, access_token: impl Into<String>) {
        *self.session.write().await = Some(Session {
            access_token: access_token.into(),
            identity: None,
        });
    }

    /// Returns true while an access token is held
    pub async fn has_session(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub(crate) async fn access_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    /// Request against the auth service; `apikey` always set.
    pub(crate) fn auth_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.config.auth_url(path))
            .header("apikey", &self.config.anon_key)
    }

    /// Request against the todo table with the session's bearer token.
    pub(crate) fn table_request(&self, method: Method, token: &str) -> RequestBuilder {
        self.http
            .request(method, self.config.table_url())
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.config.url)
            .field("table", &self.config.table)
            .finish_non_exhaustive()
    }
}
