//! todosync client.
//!
//! Keeps a per-user todo list hosted on Supabase in sync with local state.
//! The pieces, leaf first:
//!
//! - [`session`]: who is signed in, and the calls that change it
//! - [`query`]: scoped reads and writes against the item store
//! - [`cache`]: last fetched list per owner, invalidated by mutations
//! - [`view`]: filtered list, counters, rendering and command parsing
//! - [`reducer`]: ties them together as a [`Reducer`](todosync_core::reducer::Reducer)
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use todosync::{AppAction, AppEnvironment, AppReducer, AppState};
//! use todosync_core::environment::SystemClock;
//! use todosync_runtime::Store;
//! use todosync_supabase::{SupabaseClient, SupabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(SupabaseClient::new(SupabaseConfig::from_env()?)?);
//! let env = AppEnvironment::new(client.clone(), client, Arc::new(SystemClock));
//! let store = Store::new(AppState::default(), AppReducer::new(), env);
//!
//! // Adopt a held session, then add a todo and wait for the refetch
//! store.send(AppAction::RestoreSession).await?.wait().await;
//! store
//!     .send(AppAction::AddTodo { title: "Buy milk".to_string() })
//!     .await?
//!     .wait()
//!     .await;
//!
//! let left = store.state(|s| s.view().active_count).await;
//! println!("{left} left");
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod query;
pub mod reducer;
pub mod session;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use cache::QueryCache;
pub use query::TodoQueries;
pub use reducer::{AppEnvironment, AppReducer};
pub use session::{SessionManager, SessionState};
pub use types::{AppAction, AppState, ListStatus, MutationKind};
pub use view::{render, Command, TodoView};
