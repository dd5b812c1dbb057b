//! Reducer for the todo client.
//!
//! Intents update local state and describe the remote call to make; outcomes
//! fold the result back in. Every successful mutation invalidates the cached
//! list and schedules a refetch. Fetches are numbered, and only the result of
//! the latest one is kept.

use crate::query::TodoQueries;
use crate::session::SessionManager;
use crate::types::{AppAction, AppState, ListStatus, MutationKind};
use std::sync::Arc;
use todosync_core::{
    async_effect, effect::Effect, environment::Clock, reducer::Reducer, remote_effect, smallvec,
    AuthProvider, Identity, ItemStore, SmallVec, UserId,
};
use tracing::{debug, info, warn};

/// Environment dependencies for the app reducer
#[derive(Clone)]
pub struct AppEnvironment {
    /// Row storage
    pub items: Arc<dyn ItemStore>,
    /// Password sign-in and session lookup
    pub auth: Arc<dyn AuthProvider>,
    /// Clock for cache timestamps
    pub clock: Arc<dyn Clock>,
}

impl AppEnvironment {
    /// Creates a new `AppEnvironment`
    #[must_use]
    pub fn new(
        items: Arc<dyn ItemStore>,
        auth: Arc<dyn AuthProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { items, auth, clock }
    }

    /// Query layer over the item store
    #[must_use]
    pub fn queries(&self) -> TodoQueries {
        TodoQueries::new(Arc::clone(&self.items))
    }

    /// Session manager over the auth collaborator
    #[must_use]
    pub fn session(&self) -> SessionManager {
        SessionManager::new(Arc::clone(&self.auth))
    }
}

impl std::fmt::Debug for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppEnvironment").finish_non_exhaustive()
    }
}

type Effects = SmallVec<[Effect<AppAction>; 4]>;

/// Reducer for the todo client
#[derive(Clone, Debug, Default)]
pub struct AppReducer;

impl AppReducer {
    /// Creates a new `AppReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Fetch the list for the current identity, tagging the outcome with
    /// its owner and a fresh request number
    fn load(state: &mut AppState, env: &AppEnvironment) -> Effects {
        state.list = ListStatus::Loading;
        state.latest_load += 1;
        let request = state.latest_load;
        let queries = env.queries();
        let identity = state.current_identity().cloned();
        let owner = identity.as_ref().map(|identity| identity.id.clone());

        smallvec![async_effect! {
            match queries.list(identity.as_ref()).await {
                Ok(todos) => owner.map(|owner| AppAction::TodosLoaded { owner, todos, request }),
                Err(error) => Some(AppAction::LoadFailed { owner, error, request }),
            }
        }]
    }

    /// Returns true when a load outcome is for an older fetch or another user
    fn is_superseded(state: &AppState, owner: Option<&UserId>, request: u64) -> bool {
        request != state.latest_load || !state.is_current(owner)
    }

    /// Mark the current list stale and refetch it
    fn invalidate_and_refetch(state: &mut AppState, env: &AppEnvironment) -> Effects {
        let Some(owner) = state.current_identity().map(|identity| identity.id.clone()) else {
            return SmallVec::new();
        };
        state.cache.invalidate(&owner);
        Self::load(state, env)
    }

    fn mutate(state: &AppState, env: &AppEnvironment, action: AppAction) -> Effects {
        let queries = env.queries();
        let identity: Option<Identity> = state.current_identity().cloned();

        let effect = match action {
            AppAction::AddTodo { title } => remote_effect! {
                call: queries.add(identity.as_ref(), title),
                on_success: |todo| AppAction::TodoAdded { todo },
                on_error: |error| AppAction::MutationFailed { kind: MutationKind::Add, error }
            },
            AppAction::ToggleTodo { todo } => remote_effect! {
                call: queries.toggle(identity.as_ref(), &todo),
                on_success: |todo| AppAction::TodoToggled { todo },
                on_error: |error| AppAction::MutationFailed { kind: MutationKind::Toggle, error }
            },
            AppAction::EditTodo { id, title } => remote_effect! {
                call: queries.edit(identity.as_ref(), &id, title),
                on_success: |todo| AppAction::TodoEdited { todo },
                on_error: |error| AppAction::MutationFailed { kind: MutationKind::Edit, error }
            },
            AppAction::DeleteTodo { id } => remote_effect! {
                call: queries.delete(identity.as_ref(), id),
                on_success: |id| AppAction::TodoDeleted { id },
                on_error: |error| AppAction::MutationFailed { kind: MutationKind::Delete, error }
            },
            AppAction::ClearCompleted => remote_effect! {
                call: queries.clear_completed(identity.as_ref()),
                on_success: |()| AppAction::CompletedCleared,
                on_error: |error| AppAction::MutationFailed {
                    kind: MutationKind::ClearCompleted,
                    error
                }
            },
            _ => Effect::None,
        };

        smallvec![effect]
    }
}

impl Reducer for AppReducer {
    type State = AppState;
    type Action = AppAction;
    type Environment = AppEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        debug!(action = action.name(), mutation = action.is_mutation(), "Reducing");

        if action.is_intent() {
            state.notice = None;
        }

        match action {
            // ========== Session ==========
            AppAction::SignIn { credentials } => {
                state.session.begin_sign_in();
                let session = env.session();
                smallvec![remote_effect! {
                    call: session.sign_in(&credentials),
                    on_success: |identity| AppAction::SessionChanged { identity: Some(identity) },
                    on_error: |error| AppAction::SignInFailed { error }
                }]
            },

            AppAction::SignOut => {
                state.session.set_identity(None);
                state.cache.clear();
                state.list = ListStatus::Idle;
                let session = env.session();
                smallvec![async_effect! {
                    session.sign_out().await;
                    Some(AppAction::SignedOut)
                }]
            },

            AppAction::RestoreSession => {
                let session = env.session();
                smallvec![async_effect! {
                    session
                        .restore()
                        .await
                        .map(|identity| AppAction::SessionChanged { identity: Some(identity) })
                }]
            },

            AppAction::SessionChanged { identity } => {
                if state.session.set_identity(identity) {
                    state.cache.clear();
                    state.list = ListStatus::Idle;
                }
                let stale_owner = state
                    .current_identity()
                    .map(|identity| identity.id.clone())
                    .filter(|owner| state.cache.is_stale(owner));
                match stale_owner {
                    Some(owner) => {
                        info!(user_id = %owner, "Session active, loading list");
                        Self::load(state, env)
                    },
                    None => SmallVec::new(),
                }
            },

            // Only marks the end of the remote call; a session started
            // meanwhile is left alone
            AppAction::SignedOut => SmallVec::new(),

            AppAction::SignInFailed { error } => {
                state.session.fail_sign_in(&error);
                SmallVec::new()
            },

            // ========== View ==========
            AppAction::LoadTodos => Self::load(state, env),

            AppAction::SetFilter { filter } => {
                state.filter = filter;
                SmallVec::new()
            },

            // Clearing happened above
            AppAction::DismissNotice => SmallVec::new(),

            // ========== Mutations ==========
            action @ (AppAction::AddTodo { .. }
            | AppAction::ToggleTodo { .. }
            | AppAction::EditTodo { .. }
            | AppAction::DeleteTodo { .. }
            | AppAction::ClearCompleted) => Self::mutate(state, env, action),

            // ========== Outcomes ==========
            AppAction::TodosLoaded {
                owner,
                todos,
                request,
            } => {
                if Self::is_superseded(state, Some(&owner), request) {
                    debug!(%owner, request, latest = state.latest_load, "Discarding superseded list");
                    return SmallVec::new();
                }
                debug!(%owner, count = todos.len(), "List loaded");
                state.cache.store(owner, todos, env.clock.now());
                state.list = ListStatus::Ready;
                SmallVec::new()
            },

            AppAction::LoadFailed {
                owner,
                error,
                request,
            } => {
                if !Self::is_superseded(state, owner.as_ref(), request) {
                    warn!(%error, "Failed to load todos");
                    state.list = ListStatus::Failed(error.to_string());
                }
                SmallVec::new()
            },

            AppAction::TodoAdded { .. }
            | AppAction::TodoToggled { .. }
            | AppAction::TodoEdited { .. }
            | AppAction::TodoDeleted { .. }
            | AppAction::CompletedCleared => Self::invalidate_and_refetch(state, env),

            AppAction::MutationFailed { kind, error } => {
                warn!(%kind, %error, "Mutation failed");
                state.notice = Some(format!("Failed to {kind}: {error}"));
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use super::*;
    use todosync_core::{
        AuthError, Credentials, Filter, Todo, TodoError, TodoId, TodoPatch, UserId,
    };
    use todosync_testing::{
        assertions, settle_effects, test_clock, InMemoryItemStore, MockAuthProvider, ReducerTest,
    };

    fn ada() -> Identity {
        Identity::new(UserId::new("user-1"), Some("ada@example.com".into()))
    }

    fn env_with(items: &InMemoryItemStore, auth: &MockAuthProvider) -> AppEnvironment {
        AppEnvironment::new(
            Arc::new(items.clone()),
            Arc::new(auth.clone()),
            Arc::new(test_clock()),
        )
    }

    fn env() -> AppEnvironment {
        env_with(&InMemoryItemStore::new(), &MockAuthProvider::new())
    }

    fn todo(id: &str, completed: bool) -> Todo {
        Todo {
            id: TodoId::new(id),
            title: format!("todo {id}"),
            completed,
            user_id: ada().id,
            created_at: todosync_testing::mocks::test_epoch(),
        }
    }

    fn signed_in_with(todos: Vec<Todo>) -> [AppAction; 2] {
        [
            AppAction::SessionChanged {
                identity: Some(ada()),
            },
            AppAction::TodosLoaded {
                owner: ada().id,
                todos,
                request: 1,
            },
        ]
    }

    #[test]
    fn set_filter_changes_view_without_remote_call() {
        let items = InMemoryItemStore::new();
        ReducerTest::new(AppReducer::new())
            .with_env(env_with(&items, &MockAuthProvider::new()))
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![todo("1", false), todo("2", true)]))
            .when_action(AppAction::SetFilter {
                filter: Filter::Completed,
            })
            .then_state(|state| {
                assert_eq!(state.filter(), Filter::Completed);
                assert_eq!(state.view().visible.len(), 1);
                assert_eq!(state.view().active_count, 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
        assert_eq!(items.calls(), 0);
    }

    #[tokio::test]
    async fn session_change_loads_the_new_users_list() {
        let items = InMemoryItemStore::with_todos(vec![todo("1", false)]);
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env_with(&items, &MockAuthProvider::new()))
            .given_state(AppState::default())
            .when_action(AppAction::SessionChanged {
                identity: Some(ada()),
            })
            .then_state(|state| {
                assert_eq!(state.current_identity(), Some(&ada()));
                assert_eq!(state.list, ListStatus::Loading);
            })
            .then_effects(assertions::assert_has_future_effect)
            .run_returning_effects();

        let produced = settle_effects(effects).await;
        assert_eq!(
            produced,
            vec![AppAction::TodosLoaded {
                owner: ada().id,
                todos: vec![todo("1", false)],
                request: 1,
            }]
        );
    }

    #[tokio::test]
    async fn rejected_sign_in_is_displayed() {
        let auth = MockAuthProvider::new().with_account("ada@example.com", "right", "user-1");
        let env = env_with(&InMemoryItemStore::new(), &auth);
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env.clone())
            .given_state(AppState::default())
            .when_action(AppAction::SignIn {
                credentials: Credentials::new("ada@example.com", "wrong"),
            })
            .then_state(|state| assert!(state.session.is_signing_in()))
            .run_returning_effects();

        let produced = settle_effects(effects).await;
        let failure = AppAction::SignInFailed {
            error: AuthError::InvalidCredentials("Invalid login credentials".into()),
        };
        assert_eq!(produced, vec![failure.clone()]);

        ReducerTest::new(AppReducer::new())
            .with_env(env)
            .given_state(AppState::default())
            .when_action(failure)
            .then_state(|state| {
                assert_eq!(state.current_identity(), None);
                assert_eq!(
                    state.session.error(),
                    Some("Failed to sign in: Invalid credentials: Invalid login credentials")
                );
            })
            .run();
    }

    #[test]
    fn sign_out_clears_identity_and_cache_immediately() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![todo("1", false)]))
            .when_action(AppAction::SignOut)
            .then_state(|state| {
                assert_eq!(state.current_identity(), None);
                assert!(state.cache.is_empty());
                assert!(state.todos().is_empty());
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[tokio::test]
    async fn sign_out_completes_when_auth_is_unreachable() {
        let auth = MockAuthProvider::new().with_session(ada());
        auth.set_unreachable(true);
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env_with(&InMemoryItemStore::new(), &auth))
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![]))
            .when_action(AppAction::SignOut)
            .run_returning_effects();

        let produced = settle_effects(effects).await;
        assert_eq!(produced, vec![AppAction::SignedOut]);
        assert_eq!(auth.session(), None);
    }

    #[test]
    fn late_sign_out_completion_keeps_the_new_session() {
        let grace = Identity::new(UserId::new("user-2"), Some("grace@example.com".into()));
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![todo("1", false)]))
            .given_actions([
                AppAction::SignOut,
                AppAction::SessionChanged {
                    identity: Some(grace.clone()),
                },
            ])
            .when_action(AppAction::SignedOut)
            .then_state(move |state| {
                assert_eq!(state.current_identity(), Some(&grace));
                assert_eq!(state.list, ListStatus::Loading);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn add_feeds_back_the_stored_row() {
        let items = InMemoryItemStore::new();
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env_with(&items, &MockAuthProvider::new()))
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![]))
            .when_action(AppAction::AddTodo {
                title: "Buy milk".into(),
            })
            .then_effects(assertions::assert_has_future_effect)
            .run_returning_effects();

        let produced = settle_effects(effects).await;
        let [AppAction::TodoAdded { todo }] = produced.as_slice() else {
            panic!("expected TodoAdded, got {produced:?}");
        };
        assert_eq!(todo.title, "Buy milk");
        assert!(!todo.completed);
        assert_eq!(todo.user_id, ada().id);
    }

    #[tokio::test]
    async fn successful_mutation_invalidates_and_refetches() {
        let items = InMemoryItemStore::with_todos(vec![todo("1", true)]);
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env_with(&items, &MockAuthProvider::new()))
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![todo("1", false)]))
            .when_action(AppAction::TodoToggled {
                todo: todo("1", true),
            })
            .then_state(|state| {
                assert!(state.cache.is_stale(&ada().id));
                assert_eq!(state.list, ListStatus::Loading);
                // Rows stay as fetched until the refetch lands
                assert!(!state.todos()[0].completed);
            })
            .run_returning_effects();

        let produced = settle_effects(effects).await;
        assert_eq!(
            produced,
            vec![AppAction::TodosLoaded {
                owner: ada().id,
                todos: vec![todo("1", true)],
                request: 2,
            }]
        );
    }

    #[tokio::test]
    async fn failed_mutation_sets_notice_and_leaves_list_alone() {
        let items = InMemoryItemStore::new();
        let env = env_with(&items, &MockAuthProvider::new());
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env.clone())
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![todo("1", false)]))
            .when_action(AppAction::EditTodo {
                id: TodoId::new("404"),
                title: "renamed".into(),
            })
            .run_returning_effects();
        let produced = settle_effects(effects).await;
        let failure = AppAction::MutationFailed {
            kind: MutationKind::Edit,
            error: TodoError::Remote(todosync_testing::MISSING_ROW_MESSAGE.into()),
        };
        assert_eq!(produced, vec![failure.clone()]);

        ReducerTest::new(AppReducer::new())
            .with_env(env)
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![todo("1", false)]))
            .when_action(failure)
            .then_state(|state| {
                assert_eq!(
                    state.notice.as_deref(),
                    Some("Failed to edit todo: JSON object requested, multiple (or no) rows returned")
                );
                assert_eq!(state.list, ListStatus::Ready);
                assert_eq!(state.todos(), &[todo("1", false)]);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn next_intent_clears_the_notice() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState {
                notice: Some("Failed to add todo: boom".into()),
                ..AppState::default()
            })
            .when_action(AppAction::SetFilter {
                filter: Filter::Active,
            })
            .then_state(|state| assert_eq!(state.notice, None))
            .run();
    }

    #[tokio::test]
    async fn mutation_without_identity_never_reaches_the_store() {
        let items = InMemoryItemStore::new();
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env_with(&items, &MockAuthProvider::new()))
            .given_state(AppState::default())
            .when_action(AppAction::ClearCompleted)
            .run_returning_effects();

        let produced = settle_effects(effects).await;
        assert_eq!(
            produced,
            vec![AppAction::MutationFailed {
                kind: MutationKind::ClearCompleted,
                error: TodoError::Unauthenticated,
            }]
        );
        assert_eq!(items.calls(), 0);
    }

    #[test]
    fn list_for_a_previous_user_is_discarded() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .given_actions([AppAction::SessionChanged {
                identity: Some(ada()),
            }])
            .when_action(AppAction::TodosLoaded {
                owner: UserId::new("someone-else"),
                todos: vec![todo("9", false)],
                request: 1,
            })
            .then_state(|state| {
                assert!(state.todos().is_empty());
                assert_eq!(state.list, ListStatus::Loading);
            })
            .run();
    }

    #[test]
    fn older_list_response_is_dropped() {
        // Fetch 1 was overtaken by the refetch after an add
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .given_actions([
                AppAction::SessionChanged {
                    identity: Some(ada()),
                },
                AppAction::LoadTodos,
                AppAction::TodosLoaded {
                    owner: ada().id,
                    todos: vec![todo("1", false), todo("2", false)],
                    request: 2,
                },
            ])
            .when_action(AppAction::TodosLoaded {
                owner: ada().id,
                todos: vec![todo("1", false)],
                request: 1,
            })
            .then_state(|state| {
                assert_eq!(state.latest_load, 2);
                assert_eq!(state.todos().len(), 2);
                assert_eq!(state.list, ListStatus::Ready);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn older_load_failure_does_not_replace_a_newer_list() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .given_actions([
                AppAction::SessionChanged {
                    identity: Some(ada()),
                },
                AppAction::LoadTodos,
                AppAction::TodosLoaded {
                    owner: ada().id,
                    todos: vec![todo("1", false)],
                    request: 2,
                },
            ])
            .when_action(AppAction::LoadFailed {
                owner: Some(ada().id),
                error: TodoError::Network("timed out".into()),
                request: 1,
            })
            .then_state(|state| assert_eq!(state.list, ListStatus::Ready))
            .run();
    }

    #[test]
    fn failed_load_shows_the_raw_message() {
        ReducerTest::new(AppReducer::new())
            .with_env(env())
            .given_state(AppState::default())
            .given_actions([AppAction::SessionChanged {
                identity: Some(ada()),
            }])
            .when_action(AppAction::LoadFailed {
                owner: Some(ada().id),
                error: TodoError::Remote("permission denied for table todos".into()),
                request: 1,
            })
            .then_state(|state| {
                assert_eq!(
                    state.list,
                    ListStatus::Failed("permission denied for table todos".into())
                );
            })
            .run();
    }

    #[tokio::test]
    async fn restore_adopts_held_session_only() {
        let auth = MockAuthProvider::new();
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env_with(&InMemoryItemStore::new(), &auth))
            .given_state(AppState::default())
            .when_action(AppAction::RestoreSession)
            .run_returning_effects();
        assert!(settle_effects(effects).await.is_empty());

        let auth = MockAuthProvider::new().with_session(ada());
        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env_with(&InMemoryItemStore::new(), &auth))
            .given_state(AppState::default())
            .when_action(AppAction::RestoreSession)
            .run_returning_effects();
        assert_eq!(
            settle_effects(effects).await,
            vec![AppAction::SessionChanged {
                identity: Some(ada()),
            }]
        );
    }

    #[tokio::test]
    async fn toggle_sends_the_negated_displayed_value() {
        let items = InMemoryItemStore::with_todos(vec![todo("1", false)]);
        // Completed elsewhere; the view still shows it active
        items
            .update(&TodoId::new("1"), TodoPatch::Completed(true))
            .await
            .unwrap();

        let effects = ReducerTest::new(AppReducer::new())
            .with_env(env_with(&items, &MockAuthProvider::new()))
            .given_state(AppState::default())
            .given_actions(signed_in_with(vec![todo("1", false)]))
            .when_action(AppAction::ToggleTodo {
                todo: todo("1", false),
            })
            .run_returning_effects();

        let produced = settle_effects(effects).await;
        assert_eq!(
            produced,
            vec![AppAction::TodoToggled {
                todo: todo("1", true),
            }]
        );
    }
}
