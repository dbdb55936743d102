//! In-process persistence bridge.
//!
//! Keeps the last persisted snapshot and a content map in memory. Used by
//! tests and by hosts that run without a database file. Failure injection
//! (`fail_writes`) lets callers exercise the store's error path.

use std::collections::BTreeMap;

use super::{
    changed_contents, entities_changed, PersistenceBridge, PersistenceError, PersistenceResult,
};
use crate::model::snapshot::{Snapshot, SnapshotPatch};
use crate::model::tab::TabId;

#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    saved: Option<Snapshot>,
    contents: BTreeMap<TabId, String>,
    fail_writes: bool,
    bulk_writes: usize,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a previously persisted snapshot.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let contents = snapshot
            .tabs
            .iter()
            .map(|tab| (tab.id.clone(), tab.content.clone()))
            .collect();
        Self {
            saved: Some(snapshot),
            contents,
            ..Self::default()
        }
    }

    /// Makes every following write fail until reset.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn saved(&self) -> Option<&Snapshot> {
        self.saved.as_ref()
    }

    /// Number of bulk entity writes performed so far.
    pub fn bulk_writes(&self) -> usize {
        self.bulk_writes
    }

    /// Overwrites one content-store entry, as a crashed bulk write would
    /// leave it.
    pub fn put_content(&mut self, tab_id: impl Into<TabId>, content: impl Into<String>) {
        self.contents.insert(tab_id.into(), content.into());
    }

    fn check_writable(&self) -> PersistenceResult<()> {
        if self.fail_writes {
            return Err(PersistenceError::Unavailable(
                "memory store rejects writes".to_string(),
            ));
        }
        Ok(())
    }
}

impl PersistenceBridge for MemoryPersistence {
    fn load_initial_snapshot(&mut self) -> PersistenceResult<SnapshotPatch> {
        let Some(saved) = &self.saved else {
            return Ok(SnapshotPatch::default());
        };
        let tabs = saved
            .tabs
            .iter()
            .cloned()
            .map(|mut tab| {
                if let Some(content) = self.contents.get(&tab.id) {
                    tab.content = content.clone();
                }
                tab
            })
            .collect();
        Ok(SnapshotPatch {
            tabs: Some(tabs),
            groups: Some(saved.groups.clone()),
            active_tab_id: Some(saved.active_tab_id.clone()),
            active_group_filters: Some(saved.active_group_filters.clone()),
            settings: Some(saved.settings.clone()),
            history: Some(saved.history.iter().cloned().collect()),
        })
    }

    fn persist(&mut self, previous: &Snapshot, next: &Snapshot) -> PersistenceResult<()> {
        self.check_writable()?;
        for tab in changed_contents(previous, next) {
            self.contents.insert(tab.id.clone(), tab.content.clone());
        }
        if entities_changed(previous, next) {
            self.saved = Some(next.clone());
            self.bulk_writes += 1;
        }
        Ok(())
    }

    fn reserve_content_slot(&mut self, tab_id: &str) -> PersistenceResult<()> {
        self.check_writable()?;
        self.contents.entry(tab_id.to_string()).or_default();
        Ok(())
    }

    fn release_content_slot(&mut self, tab_id: &str) -> PersistenceResult<()> {
        self.check_writable()?;
        self.contents.remove(tab_id);
        Ok(())
    }

    fn load_content(&self, tab_id: &str) -> PersistenceResult<Option<String>> {
        Ok(self.contents.get(tab_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryPersistence;
    use crate::model::snapshot::Snapshot;
    use crate::model::tab::Tab;
    use crate::persistence::PersistenceBridge;

    #[test]
    fn content_store_wins_on_load() {
        let mut tab = Tab::untitled("a", 0);
        tab.content = "stale".to_string();
        let mut bridge = MemoryPersistence::with_snapshot(Snapshot {
            tabs: vec![tab],
            ..Snapshot::default()
        });
        bridge.put_content("a", "fresh");

        let patch = bridge.load_initial_snapshot().unwrap();
        assert_eq!(patch.tabs.unwrap()[0].content, "fresh");
    }

    #[test]
    fn unchanged_entities_skip_bulk_write() {
        let snapshot = Snapshot {
            tabs: vec![Tab::untitled("a", 0)],
            ..Snapshot::default()
        };
        let mut bridge = MemoryPersistence::new();
        bridge.persist(&Snapshot::default(), &snapshot).unwrap();
        bridge.persist(&snapshot, &snapshot).unwrap();
        assert_eq!(bridge.bulk_writes(), 1);
    }

    #[test]
    fn failing_writes_report_errors() {
        let mut bridge = MemoryPersistence::new();
        bridge.fail_writes(true);
        assert!(bridge.reserve_content_slot("a").is_err());
        assert!(bridge
            .persist(&Snapshot::default(), &Snapshot::default())
            .is_err());
    }
}
