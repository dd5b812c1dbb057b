//! Display filter over the todo list.

use crate::todo::Todo;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which subset of the list is displayed
///
/// A pure view concern: never sent to the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every item
    #[default]
    All,
    /// Items not yet completed
    Active,
    /// Completed items
    Completed,
}

impl Filter {
    /// All filter values, in display order
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Returns true if `todo` belongs in the filtered view
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}' (expected all, active or completed)")]
pub struct ParseFilterError(String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(ParseFilterError(other.to_string())),
        }
    }
}
