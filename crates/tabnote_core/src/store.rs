//! State store owning the current snapshot.
//!
//! # Responsibility
//! - Apply commands through the transition engine, one at a time.
//! - Write every change through the persistence bridge, diffing against
//!   the last snapshot that was written successfully.
//!
//! # Invariants
//! - The new snapshot is committed before persistence runs; a persistence
//!   failure is returned but never rolls the snapshot back.
//! - Writes that failed are retried by the next write: `persisted` only
//!   advances on success.
//! - Content-store slots exist for every tab id the store has published,
//!   and are released once the tab is gone, even after a failed write.

use std::collections::BTreeSet;

use log::{debug, info, warn};

use crate::engine::{draft_new_tab, transition, Command, SystemEnv, TransitionEnv};
use crate::model::snapshot::Snapshot;
use crate::model::tab::{Tab, TabId};
use crate::persistence::{PersistenceBridge, PersistenceResult};

/// Single-writer store over a persistence bridge.
pub struct Store<P: PersistenceBridge, E: TransitionEnv = SystemEnv> {
    snapshot: Snapshot,
    /// Last snapshot the bridge accepted.
    persisted: Snapshot,
    /// Tab ids holding a content-store slot reserved by this store.
    slots: BTreeSet<TabId>,
    persistence: P,
    env: E,
}

impl<P: PersistenceBridge> Store<P> {
    /// Opens a store with random ids and the wall clock.
    pub fn open(persistence: P) -> PersistenceResult<Self> {
        Self::open_with_env(persistence, SystemEnv)
    }
}

impl<P: PersistenceBridge, E: TransitionEnv> Store<P, E> {
    /// Rehydrates from `persistence`, or seeds one `Untitled` tab when
    /// nothing was stored.
    ///
    /// # Contract
    /// - Load errors and errors persisting the initial snapshot are returned.
    /// - The returned store satisfies every snapshot invariant.
    pub fn open_with_env(mut persistence: P, mut env: E) -> PersistenceResult<Self> {
        let patch = persistence.load_initial_snapshot().map_err(|err| {
            warn!("event=store_open module=store status=error error={err}");
            err
        })?;

        let first_launch = patch.is_empty();
        let command = if first_launch {
            Command::CreateTab(Tab::untitled(env.next_id("tab"), env.now_ms()))
        } else {
            Command::LoadSnapshot(patch)
        };

        let mut store = Self {
            snapshot: Snapshot::default(),
            persisted: Snapshot::default(),
            slots: BTreeSet::new(),
            persistence,
            env,
        };
        store.dispatch(command)?;
        info!(
            "event=store_open module=store status=ok first_launch={first_launch} tabs={} groups={}",
            store.snapshot.tabs.len(),
            store.snapshot.groups.len()
        );
        Ok(store)
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn persistence_mut(&mut self) -> &mut P {
        &mut self.persistence
    }

    /// Builds the tab the "new tab" button would create, without applying it.
    pub fn draft_new_tab(&mut self) -> Tab {
        draft_new_tab(&self.snapshot, &mut self.env)
    }

    /// Applies `command` and writes the result through.
    ///
    /// Returns `Ok(false)` when the command left the snapshot unchanged, in
    /// which case nothing is persisted.
    ///
    /// # Contract
    /// - On `Err`, `snapshot()` already reflects the command and the change
    ///   stays pending for the next write.
    pub fn dispatch(&mut self, command: Command) -> PersistenceResult<bool> {
        let tag = command.tag();
        let bare_selection = matches!(command, Command::SetActiveTab(_));
        let next = transition(&self.snapshot, command, &mut self.env);
        if next == self.snapshot {
            debug!("event=dispatch module=store status=noop command={tag}");
            return Ok(false);
        }

        // A dangling selection is legal when this command stored it or when
        // it was already dangling before.
        let carried_selection = next.dangling_selection().is_some()
            && next.active_tab_id == self.snapshot.active_tab_id;
        let checked = if bare_selection || carried_selection {
            next.check_invariants_except_selection()
        } else {
            next.check_invariants()
        };
        debug_assert!(
            checked.is_ok(),
            "command {tag} broke an invariant: {checked:?}"
        );

        self.snapshot = next;
        if let Err(err) = self.write_through() {
            warn!("event=dispatch module=store status=persist_error command={tag} error={err}");
            return Err(err);
        }
        debug!(
            "event=dispatch module=store status=ok command={tag} tabs={} history={}",
            self.snapshot.tabs.len(),
            self.snapshot.history.len()
        );
        Ok(true)
    }

    /// Whether some change has not reached the bridge yet.
    pub fn has_pending_writes(&self) -> bool {
        self.persisted != self.snapshot
    }

    /// Retries writes left pending by an earlier failure.
    ///
    /// Returns `Ok(false)` when nothing was pending.
    pub fn flush(&mut self) -> PersistenceResult<bool> {
        if !self.has_pending_writes() {
            return Ok(false);
        }
        self.write_through().map_err(|err| {
            warn!("event=flush module=store status=persist_error error={err}");
            err
        })?;
        info!("event=flush module=store status=ok");
        Ok(true)
    }

    fn write_through(&mut self) -> PersistenceResult<()> {
        let next = &self.snapshot;
        for tab in &next.tabs {
            if !self.slots.contains(&tab.id) {
                self.persistence.reserve_content_slot(&tab.id)?;
                self.slots.insert(tab.id.clone());
            }
        }
        self.persistence.persist(&self.persisted, next)?;
        let gone: Vec<TabId> = self
            .slots
            .iter()
            .filter(|id| next.tab(id).is_none())
            .cloned()
            .collect();
        for id in gone {
            self.persistence.release_content_slot(&id)?;
            self.slots.remove(&id);
        }
        self.persisted = next.clone();
        Ok(())
    }
}
