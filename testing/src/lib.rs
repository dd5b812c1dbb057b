//! # todosync Testing
//!
//! Testing utilities for the todosync workspace.
//!
//! This crate provides:
//! - In-memory implementations of the remote collaborators
//! - A Given-When-Then harness for reducers
//! - Property-based testing strategies for todo lists
//! - A fixed clock
//!
//! ## Example
//!
//! ```ignore
//! use todosync_testing::{InMemoryItemStore, MockAuthProvider, test_clock};
//!
//! #[tokio::test]
//! async fn add_then_list() {
//!     let items = InMemoryItemStore::new();
//!     let auth = MockAuthProvider::new().with_account("ada@example.com", "pw", "user-1");
//!     let env = AppEnvironment::new(Arc::new(items.clone()), Arc::new(auth), Arc::new(test_clock()));
//!
//!     let store = Store::new(AppState::default(), AppReducer, env);
//!     // ...
//!     assert_eq!(items.calls(), 2);
//! }
//! ```

use chrono::{DateTime, Utc};
use todosync_core::environment::Clock;


/// In-memory `ItemStore` and `AuthProvider`
pub mod provider_mocks;

pub use provider_mocks::{InMemoryItemStore, MockAuthProvider, MISSING_ROW_MESSAGE};
pub use reducer_test::{assertions, settle_effects, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// # Example
    ///
    /// ```
    /// use todosync_testing::mocks::FixedClock;
    /// use todosync_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_epoch())
    }

    /// 2025-01-01 00:00:00 UTC, the base time of every test fixture
    #[must_use]
    pub fn test_epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }
}

/// Property-based testing strategies
///
/// Lists are generated in creation order with unique ids, the shape the
/// backend returns from a select.
pub mod properties {
    use super::mocks::test_epoch;
    use chrono::Duration;
    use proptest::prelude::*;
    use todosync_core::{Todo, TodoId, UserId};

    /// A single todo owned by `owner`, created `offset_secs` after the test epoch
    pub fn todo_strategy(owner: UserId, offset_secs: i64) -> impl Strategy<Value = Todo> {
        ("[a-z][a-z ]{0,15}", any::<bool>()).prop_map(move |(title, completed)| Todo {
            id: TodoId::new(offset_secs.to_string()),
            title,
            completed,
            user_id: owner.clone(),
            created_at: test_epoch() + Duration::seconds(offset_secs),
        })
    }

    /// Up to `max_len` todos owned by one user, in creation order
    pub fn todo_list_strategy(max_len: usize) -> impl Strategy<Value = Vec<Todo>> {
        prop::collection::vec(("[a-z][a-z ]{0,15}", any::<bool>()), 0..=max_len).prop_map(
            |rows| {
                let owner = UserId::new("user-1");
                rows.into_iter()
                    .enumerate()
                    .map(|(index, (title, completed))| {
                        let offset = i64::try_from(index).unwrap_or(i64::MAX);
                        Todo {
                            id: TodoId::new((index + 1).to_string()),
                            title,
                            completed,
                            user_id: owner.clone(),
                            created_at: test_epoch() + Duration::seconds(offset),
                        }
                    })
                    .collect()
            },
        )
    }
}

/// Install a test-friendly tracing subscriber
///
/// Output goes through the test harness writer so it only shows for
/// failing tests. Safe to call from many tests; only the first call wins.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("todosync=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};
