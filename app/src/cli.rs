//! Command-line options.
//!
//! Backend settings come from the environment (see
//! [`SupabaseConfig::from_env`](todosync_supabase::SupabaseConfig::from_env));
//! the flags here only cover who signs in and how the client starts.

use clap::Parser;
use todosync_core::{Credentials, Filter};

/// Terminal client for a todo list hosted on Supabase.
#[derive(Parser, Debug)]
#[command(name = "todosync")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    SUPABASE_URL                   Project URL (required)
    SUPABASE_ANON_KEY              Public anon key (required)
    TODOSYNC_TABLE                 Table holding the todos (default: todos)
    TODOSYNC_REQUEST_TIMEOUT_SECS  Per-request timeout (default: 10)
    TODOSYNC_EMAIL                 Email to sign in with
    TODOSYNC_PASSWORD              Password to sign in with
    TODOSYNC_ACCESS_TOKEN          Access token from an earlier session
    RUST_LOG                       Log filter, overrides --log-level

A .env file in the working directory is loaded first.
")]
pub struct Cli {
    /// Email to sign in with at startup
    #[arg(long, env = "TODOSYNC_EMAIL")]
    pub email: Option<String>,

    /// Password for --email
    #[arg(long, env = "TODOSYNC_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Access token from an earlier session, confirmed at startup
    #[arg(long, env = "TODOSYNC_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Initial filter: all, active or completed
    #[arg(long, default_value = "all")]
    pub filter: Filter,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Startup credentials, when both halves were given
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Some(Credentials::new(email.as_str(), password.as_str())),
            _ => None,
        }
    }

    /// Default log filter directive
    #[must_use]
    pub fn log_directive(&self) -> String {
        format!("todosync={level},todosync_supabase={level}", level = self.log_level)
    }
}
