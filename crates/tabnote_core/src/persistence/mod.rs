//! Persistence bridge between the store and durable storage.
//!
//! # Responsibility
//! - Rebuild a partial snapshot at startup, reconciling tab content with
//!   the per-tab content store.
//! - Write every changed snapshot through to storage.
//!
//! # Invariants
//! - Changed tab content is written to the content store before, and
//!   independently of, the bulk entity write.
//! - The content store is the source of truth for `Tab::content` on load.
//! - Failures are reported to the caller; they never touch the in-memory
//!   snapshot.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::db::DbError;
use crate::model::snapshot::{Snapshot, SnapshotPatch};
use crate::model::tab::Tab;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryPersistence;
pub use sqlite::SqlitePersistence;

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors from persistence bridge implementations.
#[derive(Debug)]
pub enum PersistenceError {
    /// SQLite/bootstrap failure.
    Db(DbError),
    /// Stored JSON value could not be encoded or decoded.
    Serialization(serde_json::Error),
    /// Backend refused or lost the write.
    Unavailable(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "invalid stored value: {err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Durable storage seen by the store.
pub trait PersistenceBridge {
    /// Loads whatever was stored. An empty patch means first launch.
    fn load_initial_snapshot(&mut self) -> PersistenceResult<SnapshotPatch>;
    /// Writes `next` through; `previous` lets implementations skip
    /// unchanged parts.
    fn persist(&mut self, previous: &Snapshot, next: &Snapshot) -> PersistenceResult<()>;
    /// Prepares a content-store entry for a new tab.
    fn reserve_content_slot(&mut self, tab_id: &str) -> PersistenceResult<()>;
    /// Drops the content-store entry of a deleted tab.
    fn release_content_slot(&mut self, tab_id: &str) -> PersistenceResult<()>;
    /// Reads one tab's content from the content store.
    fn load_content(&self, tab_id: &str) -> PersistenceResult<Option<String>>;
}

/// Tabs in `next` that are new or whose content differs from `previous`.
pub fn changed_contents<'a>(previous: &Snapshot, next: &'a Snapshot) -> Vec<&'a Tab> {
    next.tabs
        .iter()
        .filter(|tab| {
            previous
                .tab(&tab.id)
                .map_or(true, |before| before.content != tab.content)
        })
        .collect()
}

/// Whether any durable field differs. Panel flags are not durable.
pub fn entities_changed(previous: &Snapshot, next: &Snapshot) -> bool {
    previous.tabs != next.tabs
        || previous.groups != next.groups
        || previous.settings != next.settings
        || previous.history != next.history
        || previous.active_tab_id != next.active_tab_id
        || previous.active_group_filters != next.active_group_filters
}

#[cfg(test)]
mod tests {
    use super::{changed_contents, entities_changed};
    use crate::model::snapshot::Snapshot;
    use crate::model::tab::Tab;

    #[test]
    fn detects_new_and_edited_content_only() {
        let previous = Snapshot {
            tabs: vec![Tab::untitled("a", 0), Tab::untitled("b", 0)],
            ..Snapshot::default()
        };
        let mut next = previous.clone();
        next.tabs[0].content = "edited".to_string();
        next.tabs[1].name = "renamed".to_string();
        next.tabs.push(Tab::untitled("c", 0));

        let changed: Vec<&str> = changed_contents(&previous, &next)
            .iter()
            .map(|tab| tab.id.as_str())
            .collect();
        assert_eq!(changed, vec!["a", "c"]);
    }

    #[test]
    fn panel_flags_are_not_durable() {
        let previous = Snapshot::default();
        let next = Snapshot {
            is_history_open: true,
            ..Snapshot::default()
        };
        assert!(!entities_changed(&previous, &next));
    }
}
