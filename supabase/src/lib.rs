//! Supabase collaborators for todosync.
//!
//! [`SupabaseClient`] implements both remote collaborator traits against a
//! hosted Supabase project:
//!
//! - [`AuthProvider`](todosync_core::AuthProvider) over GoTrue
//!   (`/auth/v1/token`, `/auth/v1/user`, `/auth/v1/logout`)
//! - [`ItemStore`](todosync_core::ItemStore) over PostgREST
//!   (`/rest/v1/{table}`)
//!
//! The access token obtained at sign-in is held in memory only and attached
//! to every row request. Row-level security on the backend is expected to
//! enforce ownership; the client additionally scopes every select and bulk
//! delete by `user_id`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use todosync_supabase::{SupabaseClient, SupabaseConfig};
//!
//! let client = Arc::new(SupabaseClient::new(SupabaseConfig::from_env()?)?);
//! let identity = client.sign_in(&Credentials::new("ada@example.com", "secret")).await?;
//! let todos = client.select_by_owner(&identity.id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod client;
pub mod config;
mod error;
mod rows;

pub use client::SupabaseClient;
pub use config::{ConfigError, SupabaseConfig};
