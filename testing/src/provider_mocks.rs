//! In-memory remote collaborators
//!
//! Fast, deterministic stand-ins for the hosted backend:
//! - [`InMemoryItemStore`]: a `Vec`-backed todo table with server-assigned ids
//! - [`MockAuthProvider`]: a fixed set of accounts with password sign-in
//!
//! Both count the calls they receive so tests can assert that a call was
//! never issued, and both can be told to fail the next calls.

use crate::mocks::test_epoch;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use todosync_core::providers::BoxFuture;
use todosync_core::{
    AuthError, AuthProvider, Credentials, Identity, ItemStore, NewTodo, Todo, TodoError, TodoId,
    TodoPatch, UserId,
};

/// Message returned when an update matches no row
///
/// Matches the backend's single-object response error, so tests can assert
/// the same text against either implementation.
pub const MISSING_ROW_MESSAGE: &str = "JSON object requested, multiple (or no) rows returned";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory todo table
///
/// Ids are assigned from a counter starting at 1 and creation timestamps
/// advance one second per insert from the test epoch, so ordering is
/// deterministic. Clones share the same table.
///
/// # Example
///
/// ```
/// use todosync_testing::InMemoryItemStore;
/// use todosync_core::{ItemStore, NewTodo, UserId};
///
/// # tokio_test_block_on(async {
/// let store = InMemoryItemStore::new();
/// let owner = UserId::new("user-1");
///
/// let todo = store.insert(NewTodo::new("Buy milk", owner.clone())).await.unwrap();
/// assert_eq!(todo.id.as_str(), "1");
/// assert_eq!(store.select_by_owner(&owner).await.unwrap().len(), 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryItemStore {
    rows: Arc<Mutex<Vec<Todo>>>,
    next_id: Arc<AtomicU64>,
    calls: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<TodoError>>>,
}

impl InMemoryItemStore {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding `todos`
    ///
    /// Later inserts get ids and timestamps after the seeded rows.
    #[must_use]
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        let store = Self::new();
        store
            .next_id
            .store(u64::try_from(todos.len()).unwrap_or(u64::MAX), Ordering::SeqCst);
        *lock(&store.rows) = todos;
        store
    }

    /// Snapshot of every row, regardless of owner
    #[must_use]
    pub fn rows(&self) -> Vec<Todo> {
        lock(&self.rows).clone()
    }

    /// Number of calls received, including failed ones
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fail every following call with `error` until [`Self::recover`]
    pub fn fail_with(&self, error: TodoError) {
        *lock(&self.failure) = Some(error);
    }

    /// Stop failing calls
    pub fn recover(&self) {
        *lock(&self.failure) = None;
    }

    /// Count the call and return the injected failure, if any
    fn begin_call(&self) -> Result<(), TodoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.failure).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn select_sync(&self, owner: &UserId) -> Result<Vec<Todo>, TodoError> {
        self.begin_call()?;
        let mut owned: Vec<Todo> = lock(&self.rows)
            .iter()
            .filter(|todo| todo.is_owned_by(owner))
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(owned)
    }

    fn insert_sync(&self, todo: NewTodo) -> Result<Todo, TodoError> {
        self.begin_call()?;
        let sequence = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let offset = i64::try_from(sequence).unwrap_or(i64::MAX);
        let stored = Todo {
            id: TodoId::new(sequence.to_string()),
            title: todo.title,
            completed: todo.completed,
            user_id: todo.user_id,
            created_at: test_epoch() + Duration::seconds(offset),
        };
        lock(&self.rows).push(stored.clone());
        Ok(stored)
    }

    fn update_sync(&self, id: &TodoId, patch: TodoPatch) -> Result<Todo, TodoError> {
        self.begin_call()?;
        let mut rows = lock(&self.rows);
        let row = rows
            .iter_mut()
            .find(|todo| &todo.id == id)
            .ok_or_else(|| TodoError::Remote(MISSING_ROW_MESSAGE.to_string()))?;

        match patch {
            TodoPatch::Completed(completed) => row.completed = completed,
            TodoPatch::Title(title) => row.title = title,
        }
        Ok(row.clone())
    }

    fn delete_sync(&self, id: &TodoId) -> Result<(), TodoError> {
        self.begin_call()?;
        lock(&self.rows).retain(|todo| &todo.id != id);
        Ok(())
    }

    fn delete_completed_sync(&self, owner: &UserId) -> Result<(), TodoError> {
        self.begin_call()?;
        lock(&self.rows).retain(|todo| !(todo.completed && todo.is_owned_by(owner)));
        Ok(())
    }
}

impl ItemStore for InMemoryItemStore {
    fn select_by_owner<'a>(&'a self, owner: &'a UserId) -> BoxFuture<'a, Result<Vec<Todo>, TodoError>> {
        Box::pin(async move { self.select_sync(owner) })
    }

    fn insert(&self, todo: NewTodo) -> BoxFuture<'_, Result<Todo, TodoError>> {
        Box::pin(async move { self.insert_sync(todo) })
    }

    fn update<'a>(&'a self, id: &'a TodoId, patch: TodoPatch) -> BoxFuture<'a, Result<Todo, TodoError>> {
        Box::pin(async move { self.update_sync(id, patch) })
    }

    fn delete_by_id<'a>(&'a self, id: &'a TodoId) -> BoxFuture<'a, Result<(), TodoError>> {
        Box::pin(async move { self.delete_sync(id) })
    }

    fn delete_completed_by_owner<'a>(&'a self, owner: &'a UserId) -> BoxFuture<'a, Result<(), TodoError>> {
        Box::pin(async move { self.delete_completed_sync(owner) })
    }
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// Password auth against a fixed set of accounts
///
/// Clones share the session, accounts and counters.
#[derive(Clone, Debug, Default)]
pub struct MockAuthProvider {
    accounts: Arc<Mutex<HashMap<String, Account>>>,
    session: Arc<Mutex<Option<Identity>>>,
    calls: Arc<AtomicUsize>,
    unreachable: Arc<AtomicBool>,
}

impl MockAuthProvider {
    /// Create a provider with no accounts and no session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, user_id: &str) -> Self {
        lock(&self.accounts).insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                identity: Identity::new(UserId::new(user_id), Some(email.to_string())),
            },
        );
        self
    }

    /// Start with `identity` already signed in, as after a page reload
    #[must_use]
    pub fn with_session(self, identity: Identity) -> Self {
        *lock(&self.session) = Some(identity);
        self
    }

    /// Make every following call fail with a network error (or stop doing so)
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of calls received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The identity of the held session
    #[must_use]
    pub fn session(&self) -> Option<Identity> {
        lock(&self.session).clone()
    }

    fn begin_call(&self) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AuthError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    fn sign_in_sync(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        self.begin_call()?;
        let identity = lock(&self.accounts)
            .get(&credentials.email)
            .filter(|account| account.password == credentials.password())
            .map(|account| account.identity.clone())
            .ok_or_else(|| AuthError::InvalidCredentials("Invalid login credentials".to_string()))?;

        *lock(&self.session) = Some(identity.clone());
        Ok(identity)
    }

    fn sign_out_sync(&self) -> Result<(), AuthError> {
        // The session is dropped even when the remote call fails.
        lock(&self.session).take();
        self.begin_call()
    }
}

impl AuthProvider for MockAuthProvider {
    fn sign_in<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<Identity, AuthError>> {
        Box::pin(async move { self.sign_in_sync(credentials) })
    }

    fn current_user(&self) -> BoxFuture<'_, Option<Identity>> {
        Box::pin(async move {
            if self.begin_call().is_err() {
                return None;
            }
            self.session()
        })
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<(), AuthError>> {
        Box::pin(async move { self.sign_out_sync() })
    }
}
