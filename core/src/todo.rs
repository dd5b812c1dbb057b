//! Todo records as stored by the remote table.

use crate::identity::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned identifier of a todo record
///
/// Opaque to the client. The backend may use integer or UUID primary keys,
/// so both JSON numbers and strings are accepted and kept in their textual
/// form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TodoId(String);

impl TodoId {
    /// Creates a `TodoId` from its textual form
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the textual form used in filters (`id=eq.{id}`)
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Serialize for TodoId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TodoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// A single todo record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Server-assigned identifier
    pub id: TodoId,
    /// Title text
    pub title: String,
    /// Whether the item is done
    pub completed: bool,
    /// Owner of the record
    pub user_id: UserId,
    /// Creation time, assigned by the server; used for default ordering
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// Returns true when `owner` owns this record
    #[must_use]
    pub fn is_owned_by(&self, owner: &UserId) -> bool {
        &self.user_id == owner
    }
}

/// Insert payload for a new todo
///
/// `completed` is always `false` on creation; the id and timestamp are left
/// to the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    /// Title text
    pub title: String,
    /// Always `false` for new records
    pub completed: bool,
    /// Owner of the record
    pub user_id: UserId,
}

impl NewTodo {
    /// Builds an insert payload owned by `user_id`
    #[must_use]
    pub fn new(title: impl Into<String>, user_id: UserId) -> Self {
        Self {
            title: title.into(),
            completed: false,
            user_id,
        }
    }
}
