//! Connection settings for the hosted backend.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `SUPABASE_URL` | Yes | - | Project URL (e.g., `https://xyz.supabase.co`) |
//! | `SUPABASE_ANON_KEY` | Yes | - | Public anon key, sent as `apikey` on every request |
//! | `TODOSYNC_TABLE` | No | `todos` | Table holding todo rows |
//! | `TODOSYNC_REQUEST_TIMEOUT_SECS` | No | 10 | Per-request timeout (1-300) |

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default table name.
pub const DEFAULT_TABLE: &str = "todos";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Errors that can occur while building the configuration or the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Variable name
        key: String,
        /// What was wrong with it
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),
}

/// Settings for [`SupabaseClient`](crate::SupabaseClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash
    pub url: String,
    /// Public anon key
    pub anon_key: String,
    /// Table holding todo rows
    pub table: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl SupabaseConfig {
    /// Creates a configuration with default table and timeout
    #[must_use]
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            table: DEFAULT_TABLE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Use another table
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Use another request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `SUPABASE_URL` or `SUPABASE_ANON_KEY` is not set
    /// - `SUPABASE_URL` is not an http(s) URL
    /// - `TODOSYNC_TABLE` is set but empty
    /// - `TODOSYNC_REQUEST_TIMEOUT_SECS` is not an integer in 1-300
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable
    /// name to its value.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("SUPABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_URL".to_string()))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "SUPABASE_URL".to_string(),
                message: format!("expected an http(s) URL, got '{url}'"),
            });
        }

        let anon_key = lookup("SUPABASE_ANON_KEY")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SUPABASE_ANON_KEY".to_string()))?;

        let mut config = Self::new(url.trim(), anon_key.trim());

        if let Some(table) = lookup("TODOSYNC_TABLE") {
            let table = table.trim();
            if table.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "TODOSYNC_TABLE".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
            config = config.with_table(table);
        }

        if let Some(raw) = lookup("TODOSYNC_REQUEST_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| (1..=MAX_REQUEST_TIMEOUT_SECS).contains(secs))
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "TODOSYNC_REQUEST_TIMEOUT_SECS".to_string(),
                    message: format!("expected seconds between 1 and {MAX_REQUEST_TIMEOUT_SECS}, got '{raw}'"),
                })?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.url)
    }

    pub(crate) fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }
}
