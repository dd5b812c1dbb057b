//! Application state and actions.
//!
//! `AppState` holds everything the client knows: the session, the query
//! cache, the filter and the status of the last list load. `AppAction`
//! mixes user intents with the outcomes of remote calls.

use crate::cache::QueryCache;
use crate::session::SessionState;
use crate::view::TodoView;
use todosync_core::{AuthError, Credentials, Filter, Identity, Todo, TodoError, TodoId, UserId};
use todosync_macros::Action;

/// Progress of the list query for the current identity
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ListStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// The cached list is current
    Ready,
    /// The last fetch failed; the message is shown as a banner
    Failed(String),
}

/// Which mutation an outcome refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    /// Create a todo
    Add,
    /// Flip the completed flag
    Toggle,
    /// Replace the title
    Edit,
    /// Remove one todo
    Delete,
    /// Remove every completed todo
    ClearCompleted,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Add => "add todo",
            Self::Toggle => "update todo",
            Self::Edit => "edit todo",
            Self::Delete => "delete todo",
            Self::ClearCompleted => "clear completed todos",
        })
    }
}

/// Client state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    /// Who is signed in
    pub session: SessionState,
    /// Fetched lists
    pub cache: QueryCache,
    /// Display filter
    pub filter: Filter,
    /// Status of the list query
    pub list: ListStatus,
    /// Failed-mutation notice, cleared by the next intent
    pub notice: Option<String>,
    /// Number of the most recently issued list fetch
    ///
    /// Load outcomes carrying an older number are dropped, so a slow fetch
    /// can never overwrite the result of a newer one.
    pub latest_load: u64,
}

impl AppState {
    /// State with an initial filter
    #[must_use]
    pub fn with_filter(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// The signed-in identity, if any
    #[must_use]
    pub const fn current_identity(&self) -> Option<&Identity> {
        self.session.current_identity()
    }

    /// Current filter
    #[must_use]
    pub const fn filter(&self) -> Filter {
        self.filter
    }

    /// Cached list of the signed-in user, empty when signed out
    #[must_use]
    pub fn todos(&self) -> &[Todo] {
        self.current_identity()
            .map_or(&[][..], |identity| self.cache.todos(&identity.id))
    }

    /// Derived, filtered view of the cached list
    #[must_use]
    pub fn view(&self) -> TodoView {
        TodoView::compose(self.todos(), self.filter)
    }

    /// Returns true when `owner` is the signed-in user
    pub(crate) fn is_current(&self, owner: Option<&UserId>) -> bool {
        self.current_identity().map(|identity| &identity.id) == owner
    }
}

/// Intents and outcomes
#[derive(Action, Clone, Debug, PartialEq)]
pub enum AppAction {
    // ========== Session intents ==========
    /// Sign in with a password
    #[intent]
    SignIn {
        /// Email and password
        credentials: Credentials,
    },

    /// End the session
    #[intent]
    SignOut,

    /// Adopt a session the auth collaborator already holds
    #[intent]
    RestoreSession,

    // ========== View intents ==========
    /// Fetch the list for the current identity
    #[intent]
    LoadTodos,

    /// Change the display filter
    #[intent]
    SetFilter {
        /// New filter
        filter: Filter,
    },

    /// Hide the failed-mutation notice
    #[intent]
    DismissNotice,

    // ========== Mutations ==========
    /// Create a todo with this (already trimmed) title
    #[mutation]
    AddTodo {
        /// Title
        title: String,
    },

    /// Flip the completed flag of this todo as displayed
    #[mutation]
    ToggleTodo {
        /// The todo as last fetched
        todo: Todo,
    },

    /// Replace a title
    #[mutation]
    EditTodo {
        /// Target
        id: TodoId,
        /// New (already trimmed) title
        title: String,
    },

    /// Remove a todo
    #[mutation]
    DeleteTodo {
        /// Target
        id: TodoId,
    },

    /// Remove every completed todo
    #[mutation]
    ClearCompleted,

    // ========== Outcomes ==========
    /// A session was started or restored
    #[outcome]
    SessionChanged {
        /// New identity, `None` when nothing was held
        identity: Option<Identity>,
    },

    /// Sign-in was rejected or could not be attempted
    #[outcome]
    SignInFailed {
        /// Why
        error: AuthError,
    },

    /// The remote sign-out finished; local state was cleared already
    #[outcome]
    SignedOut,

    /// A list fetch finished
    #[outcome]
    TodosLoaded {
        /// Whose list
        owner: UserId,
        /// Rows, oldest first
        todos: Vec<Todo>,
        /// Number of the fetch, see [`AppState::latest_load`]
        request: u64,
    },

    /// A list fetch failed
    #[outcome]
    LoadFailed {
        /// Whose list was requested, `None` when signed out
        owner: Option<UserId>,
        /// Why
        error: TodoError,
        /// Number of the fetch
        request: u64,
    },

    /// A todo was created
    #[outcome]
    TodoAdded {
        /// The stored row
        todo: Todo,
    },

    /// A todo's completed flag was written
    #[outcome]
    TodoToggled {
        /// The stored row
        todo: Todo,
    },

    /// A todo's title was written
    #[outcome]
    TodoEdited {
        /// The stored row
        todo: Todo,
    },

    /// A todo was removed (or never existed)
    #[outcome]
    TodoDeleted {
        /// Its id
        id: TodoId,
    },

    /// Completed todos were removed
    #[outcome]
    CompletedCleared,

    /// A mutation failed; state is unchanged apart from the notice
    #[outcome]
    MutationFailed {
        /// Which mutation
        kind: MutationKind,
        /// Why
        error: TodoError,
    },
}
