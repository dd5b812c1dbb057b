//! Todo query/mutation layer.
//!
//! Every operation takes the current identity explicitly and fails with
//! [`TodoError::Unauthenticated`] before touching the item store when there
//! is none. Results are returned as the backend reported them; invalidating
//! and refetching the cached list is the reducer's job.

use std::sync::Arc;
use todosync_core::{Identity, ItemStore, NewTodo, Todo, TodoError, TodoId, TodoPatch};
use tracing::debug;

/// Scoped reads and writes against the item store
#[derive(Clone)]
pub struct TodoQueries {
    items: Arc<dyn ItemStore>,
}

fn require(identity: Option<&Identity>) -> Result<&Identity, TodoError> {
    identity.ok_or(TodoError::Unauthenticated)
}

impl TodoQueries {
    /// Creates the query layer over `items`
    #[must_use]
    pub fn new(items: Arc<dyn ItemStore>) -> Self {
        Self { items }
    }

    /// All todos owned by `identity`, oldest first.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without an identity; otherwise the store's error.
    pub async fn list(&self, identity: Option<&Identity>) -> Result<Vec<Todo>, TodoError> {
        let identity = require(identity)?;
        debug!(user_id = %identity.id, "list");
        self.items.select_by_owner(&identity.id).await
    }

    /// Create a todo owned by `identity`, not completed.
    ///
    /// The title is sent as given.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without an identity; otherwise the store's error.
    pub async fn add(&self, identity: Option<&Identity>, title: String) -> Result<Todo, TodoError> {
        let identity = require(identity)?;
        debug!(user_id = %identity.id, "add");
        self.items.insert(NewTodo::new(title, identity.id.clone())).await
    }

    /// Flip `todo.completed`, sending the negated value it was displayed with.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without an identity; otherwise the store's error.
    pub async fn toggle(&self, identity: Option<&Identity>, todo: &Todo) -> Result<Todo, TodoError> {
        require(identity)?;
        debug!(todo_id = %todo.id, completed = !todo.completed, "toggle");
        self.items
            .update(&todo.id, TodoPatch::Completed(!todo.completed))
            .await
    }

    /// Replace the title of `id`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without an identity; otherwise the store's error.
    pub async fn edit(
        &self,
        identity: Option<&Identity>,
        id: &TodoId,
        title: String,
    ) -> Result<Todo, TodoError> {
        require(identity)?;
        debug!(todo_id = %id, "edit");
        self.items.update(id, TodoPatch::Title(title)).await
    }

    /// Remove `id` and hand it back.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without an identity; otherwise the store's error.
    pub async fn delete(&self, identity: Option<&Identity>, id: TodoId) -> Result<TodoId, TodoError> {
        require(identity)?;
        debug!(todo_id = %id, "delete");
        self.items.delete_by_id(&id).await?;
        Ok(id)
    }

    /// Remove every completed todo owned by `identity`.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` without an identity; otherwise the store's error.
    pub async fn clear_completed(&self, identity: Option<&Identity>) -> Result<(), TodoError> {
        let identity = require(identity)?;
        debug!(user_id = %identity.id, "clear completed");
        self.items.delete_completed_by_owner(&identity.id).await
    }
}

impl std::fmt::Debug for TodoQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoQueries").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use todosync_core::UserId;
    use todosync_testing::InMemoryItemStore;

    fn setup() -> (InMemoryItemStore, TodoQueries, Identity) {
        let items = InMemoryItemStore::new();
        let queries = TodoQueries::new(Arc::new(items.clone()));
        let identity = Identity::new(UserId::new("user-1"), Some("ada@example.com".into()));
        (items, queries, identity)
    }

    #[tokio::test]
    async fn add_then_list_yields_one_new_active_record() {
        let (_, queries, me) = setup();

        let added = queries.add(Some(&me), "Buy milk".into()).await.unwrap();
        let listed = queries.list(Some(&me)).await.unwrap();

        assert_eq!(listed, vec![added.clone()]);
        assert_eq!(added.title, "Buy milk");
        assert!(!added.completed);
        assert_eq!(added.user_id, me.id);
    }

    #[tokio::test]
    async fn toggle_twice_restores_original_value() {
        let (_, queries, me) = setup();
        let original = queries.add(Some(&me), "Walk dog".into()).await.unwrap();

        let once = queries.toggle(Some(&me), &original).await.unwrap();
        let twice = queries.toggle(Some(&me), &once).await.unwrap();

        assert!(once.completed);
        assert_eq!(twice.completed, original.completed);
    }

    #[tokio::test]
    async fn toggle_sends_the_negation_of_the_displayed_value() {
        let (items, queries, me) = setup();
        let todo = queries.add(Some(&me), "Read".into()).await.unwrap();

        // Someone else completed it meanwhile; our view still says active.
        items
            .update(&todo.id, TodoPatch::Completed(true))
            .await
            .unwrap();
        let result = queries.toggle(Some(&me), &todo).await.unwrap();

        assert!(result.completed);
    }

    #[tokio::test]
    async fn clear_completed_keeps_active_records() {
        let (_, queries, me) = setup();
        let done = queries.add(Some(&me), "done".into()).await.unwrap();
        let active = queries.add(Some(&me), "active".into()).await.unwrap();
        queries.toggle(Some(&me), &done).await.unwrap();

        queries.clear_completed(Some(&me)).await.unwrap();
        let listed = queries.list(Some(&me)).await.unwrap();

        assert_eq!(listed, vec![active]);
    }

    #[tokio::test]
    async fn delete_of_nonexistent_id_returns_the_id() {
        let (_, queries, me) = setup();
        let id = TodoId::new("404");

        assert_eq!(queries.delete(Some(&me), id.clone()).await, Ok(id));
    }

    #[tokio::test]
    async fn every_operation_without_identity_is_unauthenticated_and_silent() {
        let (items, queries, me) = setup();
        let todo = queries.add(Some(&me), "x".into()).await.unwrap();
        let calls_before = items.calls();

        assert_eq!(queries.list(None).await, Err(TodoError::Unauthenticated));
        assert_eq!(queries.add(None, "y".into()).await, Err(TodoError::Unauthenticated));
        assert_eq!(queries.toggle(None, &todo).await, Err(TodoError::Unauthenticated));
        assert_eq!(
            queries.edit(None, &todo.id, "z".into()).await,
            Err(TodoError::Unauthenticated)
        );
        assert_eq!(
            queries.delete(None, todo.id.clone()).await,
            Err(TodoError::Unauthenticated)
        );
        assert_eq!(
            queries.clear_completed(None).await,
            Err(TodoError::Unauthenticated)
        );

        assert_eq!(items.calls(), calls_before);
    }

    #[tokio::test]
    async fn backend_errors_pass_through_unchanged() {
        let (items, queries, me) = setup();
        items.fail_with(TodoError::Remote("permission denied for table todos".into()));

        assert_eq!(
            queries.list(Some(&me)).await,
            Err(TodoError::Remote("permission denied for table todos".into()))
        );
    }
}
