//! Watch-mode change events.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of change a watched file underwent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchEvent {
    /// The file was created.
    Create,
    /// The file was modified.
    Update,
    /// The file was deleted.
    Delete,
}

impl WatchEvent {
    /// Returns the string name of this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
