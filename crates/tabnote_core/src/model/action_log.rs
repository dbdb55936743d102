//! Bounded action history.
//!
//! # Invariants
//! - Entries are ordered newest first.
//! - At most [`HISTORY_LIMIT`] entries are retained; the oldest insertion
//!   is dropped first regardless of its timestamp.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum retained history entries.
pub const HISTORY_LIMIT: usize = 100;

/// Log tags produced by the core and its collaborators.
pub mod kinds {
    pub const CREATE_TAB: &str = "create_tab";
    pub const RENAME_TAB: &str = "rename_tab";
    pub const DELETE_TAB: &str = "delete_tab";
    pub const CREATE_GROUP: &str = "create_group";
    pub const DELETE_GROUP: &str = "delete_group";
    pub const SETTINGS: &str = "settings";
    pub const SAVE_CLOUD: &str = "save_cloud";
    pub const LOAD_CLOUD: &str = "load_cloud";
}

/// One human-readable history line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: String,
    /// Enum-like tag, see [`kinds`].
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

/// Newest-first ring buffer of [`ActionLogEntry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLog {
    entries: VecDeque<ActionLogEntry>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log from newest-first entries, trimming to the limit.
    pub fn from_entries(entries: impl IntoIterator<Item = ActionLogEntry>) -> Self {
        let mut entries: VecDeque<_> = entries.into_iter().collect();
        entries.truncate(HISTORY_LIMIT);
        Self { entries }
    }

    /// Records `entry` as the newest and evicts past the limit.
    pub fn push(&mut self, entry: ActionLogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_LIMIT);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn newest(&self) -> Option<&ActionLogEntry> {
        self.entries.front()
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionLog, ActionLogEntry, HISTORY_LIMIT};

    fn entry(index: usize) -> ActionLogEntry {
        ActionLogEntry {
            id: format!("log-{index}"),
            kind: "test".to_string(),
            description: format!("entry {index}"),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn push_evicts_oldest_insertion() {
        let mut log = ActionLog::new();
        for index in 0..(HISTORY_LIMIT + 5) {
            log.push(entry(index));
        }
        assert_eq!(log.len(), HISTORY_LIMIT);
        assert_eq!(log.newest().map(|e| e.id.as_str()), Some("log-104"));
        assert_eq!(log.iter().last().map(|e| e.id.as_str()), Some("log-5"));
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut log = ActionLog::new();
        log.push(entry(1));
        let value = serde_json::to_value(&log).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["type"], "test");
    }
}
