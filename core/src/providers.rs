//! Remote collaborator traits.
//!
//! The hosted backend is an external collaborator: this crate only
//! describes the calls the client makes. The reducer never calls these
//! traits directly; effects built by the query layer do.
//!
//! ```text
//! ┌──────────────┐  intents   ┌──────────────┐  effects   ┌──────────────┐
//! │ View         │──────────▶ │ Reducer      │──────────▶ │ ItemStore /  │
//! │ Composer     │            │ (pure)       │            │ AuthProvider │
//! └──────────────┘            └──────────────┘ ◀──────────└──────────────┘
//!                                               outcomes
//! ```
//!
//! # Dyn Compatibility
//!
//! Both traits return `Pin<Box<dyn Future>>` instead of using `async fn`
//! so they can be held as `Arc<dyn ItemStore>` / `Arc<dyn AuthProvider>`
//! in the environment and moved into effect futures.

use crate::error::{AuthError, TodoError};
use crate::identity::{Credentials, Identity, UserId};
use crate::todo::{NewTodo, Todo, TodoId};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by collaborator calls
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Partial update applied to a single record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoPatch {
    /// Set the completed flag to this value
    Completed(bool),
    /// Replace the title
    Title(String),
}

/// Row storage for todo records.
///
/// Implementations must honour owner scoping: reads and bulk deletes only
/// touch rows whose `user_id` matches the given owner.
pub trait ItemStore: Send + Sync {
    /// Select every record owned by `owner`, ordered by creation time ascending.
    ///
    /// # Errors
    ///
    /// - `Remote`: the backend rejected the query
    /// - `Network`: the call could not be completed
    fn select_by_owner<'a>(&'a self, owner: &'a UserId) -> BoxFuture<'a, Result<Vec<Todo>, TodoError>>;

    /// Insert one record and return it as stored (with server-assigned id and timestamp).
    ///
    /// # Errors
    ///
    /// - `Remote`: the backend rejected the insert
    /// - `Network`: the call could not be completed
    fn insert(&self, todo: NewTodo) -> BoxFuture<'_, Result<Todo, TodoError>>;

    /// Update one record by id and return it as stored.
    ///
    /// # Errors
    ///
    /// - `Remote`: no record matched, or the backend rejected the update
    /// - `Network`: the call could not be completed
    fn update<'a>(&'a self, id: &'a TodoId, patch: TodoPatch) -> BoxFuture<'a, Result<Todo, TodoError>>;

    /// Delete one record by id. Deleting an id that matches nothing succeeds.
    ///
    /// # Errors
    ///
    /// - `Remote`: the backend rejected the delete
    /// - `Network`: the call could not be completed
    fn delete_by_id<'a>(&'a self, id: &'a TodoId) -> BoxFuture<'a, Result<(), TodoError>>;

    /// Delete every completed record owned by `owner`.
    ///
    /// # Errors
    ///
    /// - `Remote`: the backend rejected the delete
    /// - `Network`: the call could not be completed
    fn delete_completed_by_owner<'a>(&'a self, owner: &'a UserId) -> BoxFuture<'a, Result<(), TodoError>>;
}

/// Password authentication against the hosted auth service.
pub trait AuthProvider: Send + Sync {
    /// Exchange credentials for an identity. One attempt, no retry.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials`: the service rejected the credentials
    /// - `Network`: the service could not be reached
    fn sign_in<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Identity, AuthError>>;

    /// The identity of the currently held session, if any.
    fn current_user(&self) -> BoxFuture<'_, Option<Identity>>;

    /// End the session. Always clears local session material; a failed
    /// remote call is reported but does not keep the session alive.
    ///
    /// # Errors
    ///
    /// - `Network`: the remote logout call failed (local state is already cleared)
    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>>;
}
