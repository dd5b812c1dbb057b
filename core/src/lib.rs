//! # todosync Core
//!
//! Domain types, provider traits and reducer primitives for the todosync
//! client.
//!
//! The client keeps a remote, per-user todo list in sync with local state.
//! All business logic lives in reducers: pure functions that take the
//! current state, an action and the injected environment, mutate the state
//! in place and return descriptions of the side effects to run. The runtime
//! crate executes those effects and feeds their outcomes back in.
//!
//! ## Core Concepts
//!
//! - **State**: Everything the client knows (session, cached list, filter)
//! - **Action**: User intents plus the outcomes of remote calls
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: A description of a remote call, executed by the runtime
//! - **Environment**: The remote collaborators, injected as trait objects
//!
//! ## Collaborators
//!
//! The hosted backend is reached only through two traits:
//!
//! - [`providers::ItemStore`]: row storage for todo records
//! - [`providers::AuthProvider`]: password sign-in and session lookup
//!
//! Production implementations live in `todosync-supabase`; in-memory
//! implementations for tests live in `todosync-testing`.

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Effect construction macros
pub mod effect_macros;

/// Error taxonomy for remote operations
pub mod error;

/// Which subset of the list is displayed
pub mod filter;

/// Session identity and sign-in credentials
pub mod identity;

/// Remote collaborator traits
pub mod providers;

/// Todo records and their identifiers
pub mod todo;

pub use error::{AuthError, TodoError};
pub use filter::Filter;
pub use identity::{Credentials, Identity, UserId};
pub use providers::{AuthProvider, ItemStore, TodoPatch};
pub use todo::{NewTodo, Todo, TodoId};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never perform I/O themselves; remote calls are returned as
/// [`Effect`](crate::effect::Effect) values.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for AppReducer {
    ///     type State = AppState;
    ///     type Action = AppAction;
    ///     type Environment = AppEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut AppState,
    ///         action: AppAction,
    ///         env: &AppEnvironment,
    ///     ) -> SmallVec<[Effect<AppAction>; 4]> {
    ///         match action {
    ///             AppAction::SetFilter { filter } => {
    ///                 state.filter = filter;
    ///                 SmallVec::new()
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns the effects the runtime
        /// should execute. Most actions produce zero or one effect, hence
        /// the inline capacity of four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values, not execution.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// A boxed, sendable future yielding an optional feedback action
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are returned from reducers
    /// and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another
        Sequential(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// If the future yields `Some(action)`, the action is fed back into the reducer.
        Future(EffectFuture<Action>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap a future as an effect
        #[must_use]
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Combine effects to run concurrently
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Returns true for `Effect::None`
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// Remote collaborators are injected as trait objects (see [`providers`]);
/// this module holds the remaining ambient dependency, time.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// The client reads time only to stamp notices and cache entries; todo
    /// creation timestamps are always assigned by the server.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[test]
    fn effect_debug_hides_future_body() {
        let effect: Effect<u8> = Effect::future(async { Some(1) });
        assert_eq!(format!("{effect:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn merge_and_chain_wrap_children() {
        let merged: Effect<u8> = Effect::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::Parallel(ref v) if v.len() == 2));

        let chained: Effect<u8> = Effect::chain(vec![Effect::None]);
        assert!(matches!(chained, Effect::Sequential(ref v) if v.len() == 1));
    }

    #[test]
    fn is_none_only_for_none() {
        assert!(Effect::<u8>::None.is_none());
        assert!(!Effect::<u8>::future(async { None }).is_none());
    }
}
