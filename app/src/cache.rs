//! Query cache for fetched lists.
//!
//! Entries are keyed by owner and tag. A successful mutation marks the entry
//! stale; the reducer then refetches and replaces it. The cache is never
//! patched in place and is not authoritative.

use std::collections::HashMap;
use todosync_core::{DateTime, Todo, UserId, Utc};

/// What a cache entry holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryTag {
    /// The owner's full todo list
    TodoList,
}

/// Last known result of one query
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// Rows as the backend returned them
    pub todos: Vec<Todo>,
    /// Set by a successful mutation until the next fetch lands
    pub stale: bool,
    /// When the rows were fetched
    pub fetched_at: DateTime<Utc>,
}

/// Cache of fetched lists keyed by (owner, tag)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryCache {
    entries: HashMap<(UserId, QueryTag), CacheEntry>,
}

impl QueryCache {
    /// Entry for `owner`'s list, if fetched
    #[must_use]
    pub fn get(&self, owner: &UserId) -> Option<&CacheEntry> {
        self.entries.get(&(owner.clone(), QueryTag::TodoList))
    }

    /// Cached rows for `owner`, empty when never fetched
    #[must_use]
    pub fn todos(&self, owner: &UserId) -> &[Todo] {
        self.get(owner).map_or(&[][..], |entry| entry.todos.as_slice())
    }

    /// Replace `owner`'s list with a fresh fetch
    pub fn store(&mut self, owner: UserId, todos: Vec<Todo>, fetched_at: DateTime<Utc>) {
        self.entries.insert(
            (owner, QueryTag::TodoList),
            CacheEntry {
                todos,
                stale: false,
                fetched_at,
            },
        );
    }

    /// Mark `owner`'s list stale; returns false when nothing was cached
    pub fn invalidate(&mut self, owner: &UserId) -> bool {
        match self.entries.get_mut(&(owner.clone(), QueryTag::TodoList)) {
            Some(entry) => {
                entry.stale = true;
                true
            },
            None => false,
        }
    }

    /// Returns true when `owner`'s list must be refetched
    #[must_use]
    pub fn is_stale(&self, owner: &UserId) -> bool {
        self.get(owner).is_none_or(|entry| entry.stale)
    }

    /// Forget everything (sign-out, user change)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
