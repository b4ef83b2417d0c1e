use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a tracked show. The discriminants are what the store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShowStatus {
    #[default]
    Running,
    Suspended,
    Ended,
}

impl ShowStatus {
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Running => 1,
            Self::Suspended => 2,
            Self::Ended => 3,
        }
    }

    /// Unknown values fall back to `Running` so a hand-edited row never blocks a refresh.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        match value {
            2 => Self::Suspended,
            3 => Self::Ended,
            _ => Self::Running,
        }
    }
}

impl fmt::Display for ShowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Suspended => "suspended",
            Self::Ended => "ended",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    /// Assigned by the store; `None` until the show has been persisted.
    pub id: Option<i32>,
    pub name: String,
    /// Source identifier: a listing-site URL or a numeric API id. Unique per store.
    pub url: String,
    pub updated: NaiveDateTime,
    pub status: ShowStatus,
    pub enabled: bool,
}

impl Show {
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            updated: DateTime::<Utc>::UNIX_EPOCH.naive_utc(),
            status: ShowStatus::Running,
            enabled: true,
        }
    }

    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

impl PartialEq for Show {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.url == other.url
    }
}

impl Eq for Show {}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Show: {}", self.name)
    }
}
