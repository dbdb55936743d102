//! SQLite-backed persistence bridge.
//!
//! # Responsibility
//! - Store tabs, groups, membership, settings and history in relational
//!   tables, replacing them wholesale on each changed snapshot.
//! - Keep the per-tab content store (`tab_contents`) ahead of the bulk
//!   write so an interrupted write never loses typed text.
//!
//! # Invariants
//! - Bulk writes run in one immediate transaction.
//! - `tab_contents` wins over `tabs.content` when rehydrating.
//! - Legacy root display keys are written alongside `settings` and win
//!   over it on read.

use std::collections::HashMap;
use std::path::Path;

use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{changed_contents, entities_changed, PersistenceBridge, PersistenceResult};
use crate::db::{open_db, open_db_in_memory};
use crate::model::action_log::ActionLogEntry;
use crate::model::group::Group;
use crate::model::settings::{LegacySettingsFields, Settings};
use crate::model::snapshot::{Snapshot, SnapshotPatch};
use crate::model::tab::Tab;

const KEY_SETTINGS: &str = "settings";
const KEY_LEGACY_SETTINGS: &str = "legacy_settings";
const KEY_ACTIVE_TAB: &str = "active_tab_id";
const KEY_GROUP_FILTERS: &str = "active_group_filters";

/// Persistence bridge owning one migrated SQLite connection.
pub struct SqlitePersistence {
    conn: Connection,
}

impl SqlitePersistence {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }

    /// Opens a migrated in-memory database.
    pub fn open_in_memory() -> PersistenceResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps a connection already returned by [`crate::db::open_db`].
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn write_contents(&mut self, tabs: &[&Tab]) -> PersistenceResult<()> {
        if tabs.is_empty() {
            return Ok(());
        }
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for tab in tabs {
            tx.execute(
                "INSERT INTO tab_contents (tab_id, content, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(tab_id) DO UPDATE SET
                    content = excluded.content,
                    updated_at = excluded.updated_at;",
                params![tab.id, tab.content],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn write_entities(&mut self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute("DELETE FROM group_members;", [])?;
        tx.execute("DELETE FROM tab_groups;", [])?;
        tx.execute("DELETE FROM tabs;", [])?;
        tx.execute("DELETE FROM action_log;", [])?;

        for (position, tab) in snapshot.tabs.iter().enumerate() {
            tx.execute(
                "INSERT INTO tabs (
                    id, position, name, content, color, group_id, scroll_position, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    tab.id,
                    position as i64,
                    tab.name,
                    tab.content,
                    tab.color,
                    tab.group_id,
                    tab.scroll_position,
                    tab.created_at,
                ],
            )?;
        }

        for (position, group) in snapshot.groups.iter().enumerate() {
            tx.execute(
                "INSERT INTO tab_groups (id, position, name, color, icon, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    group.id,
                    position as i64,
                    group.name,
                    group.color,
                    group.icon,
                    group.order,
                ],
            )?;
            for (member_position, tab_id) in group.tab_ids.iter().enumerate() {
                tx.execute(
                    "INSERT OR IGNORE INTO group_members (group_id, tab_id, position)
                     VALUES (?1, ?2, ?3);",
                    params![group.id, tab_id, member_position as i64],
                )?;
            }
        }

        for (seq, entry) in snapshot.history.iter().enumerate() {
            tx.execute(
                "INSERT INTO action_log (seq, id, kind, description, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    seq as i64,
                    entry.id,
                    entry.kind,
                    entry.description,
                    entry.timestamp,
                ],
            )?;
        }

        put_state(&tx, KEY_SETTINGS, &snapshot.settings)?;
        put_state(
            &tx,
            KEY_LEGACY_SETTINGS,
            &LegacySettingsFields::from_settings(&snapshot.settings),
        )?;
        put_state(&tx, KEY_ACTIVE_TAB, &snapshot.active_tab_id)?;
        put_state(&tx, KEY_GROUP_FILTERS, &snapshot.active_group_filters)?;

        tx.commit()?;
        Ok(())
    }

    fn read_tabs(&self) -> PersistenceResult<Vec<Tab>> {
        let contents = self.read_content_store()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, name, content, color, group_id, scroll_position, created_at
             FROM tabs
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut tabs = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            let stored: String = row.get("content")?;
            let content = contents.get(&id).cloned().unwrap_or(stored);
            tabs.push(Tab {
                name: row.get("name")?,
                content,
                color: row.get("color")?,
                group_id: row.get("group_id")?,
                scroll_position: row.get("scroll_position")?,
                created_at: row.get("created_at")?,
                id,
            });
        }
        Ok(tabs)
    }

    fn read_content_store(&self) -> PersistenceResult<HashMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT tab_id, content FROM tab_contents;")?;
        let mut rows = stmt.query([])?;
        let mut contents = HashMap::new();
        while let Some(row) = rows.next()? {
            contents.insert(row.get(0)?, row.get(1)?);
        }
        Ok(contents)
    }

    fn read_groups(&self) -> PersistenceResult<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, icon, sort_order
             FROM tab_groups
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            let tab_ids = load_members(&self.conn, &id)?;
            groups.push(Group {
                name: row.get("name")?,
                color: row.get("color")?,
                icon: row.get("icon")?,
                order: row.get("sort_order")?,
                tab_ids,
                id,
            });
        }
        Ok(groups)
    }

    fn read_history(&self) -> PersistenceResult<Vec<ActionLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, description, timestamp
             FROM action_log
             ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(ActionLogEntry {
                id: row.get("id")?,
                kind: row.get("kind")?,
                description: row.get("description")?,
                timestamp: row.get("timestamp")?,
            });
        }
        Ok(entries)
    }

    fn read_settings(&self) -> PersistenceResult<Option<Settings>> {
        let nested: Option<Settings> = get_state(&self.conn, KEY_SETTINGS)?;
        let legacy: Option<LegacySettingsFields> = get_state(&self.conn, KEY_LEGACY_SETTINGS)?;
        Ok(match (nested, legacy) {
            (None, None) => None,
            (nested, legacy) => {
                let legacy = legacy.unwrap_or_default();
                Some(legacy.apply_over(nested.unwrap_or_default()))
            }
        })
    }
}

impl PersistenceBridge for SqlitePersistence {
    fn load_initial_snapshot(&mut self) -> PersistenceResult<SnapshotPatch> {
        let tabs = self.read_tabs()?;
        let groups = self.read_groups()?;
        let history = self.read_history()?;
        let settings = self.read_settings()?;
        let active_tab_id: Option<Option<String>> = get_state(&self.conn, KEY_ACTIVE_TAB)?;
        let active_group_filters: Option<Vec<String>> =
            get_state(&self.conn, KEY_GROUP_FILTERS)?;

        info!(
            "event=snapshot_load module=persistence status=ok tabs={} groups={} history={}",
            tabs.len(),
            groups.len(),
            history.len()
        );

        Ok(SnapshotPatch {
            tabs: Some(tabs),
            groups: (!groups.is_empty()).then_some(groups),
            active_tab_id,
            active_group_filters,
            settings,
            history: (!history.is_empty()).then_some(history),
        })
    }

    fn persist(&mut self, previous: &Snapshot, next: &Snapshot) -> PersistenceResult<()> {
        let changed = changed_contents(previous, next);
        if let Err(err) = self.write_contents(&changed) {
            warn!(
                "event=content_write module=persistence status=error tabs={} error={err}",
                changed.len()
            );
            return Err(err);
        }

        if !entities_changed(previous, next) {
            return Ok(());
        }
        if let Err(err) = self.write_entities(next) {
            warn!(
                "event=snapshot_write module=persistence status=error tabs={} error={err}",
                next.tabs.len()
            );
            return Err(err);
        }
        Ok(())
    }

    fn reserve_content_slot(&mut self, tab_id: &str) -> PersistenceResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO tab_contents (tab_id, content) VALUES (?1, '');",
            [tab_id],
        )?;
        Ok(())
    }

    fn release_content_slot(&mut self, tab_id: &str) -> PersistenceResult<()> {
        self.conn
            .execute("DELETE FROM tab_contents WHERE tab_id = ?1;", [tab_id])?;
        Ok(())
    }

    fn load_content(&self, tab_id: &str) -> PersistenceResult<Option<String>> {
        let content = self
            .conn
            .query_row(
                "SELECT content FROM tab_contents WHERE tab_id = ?1;",
                [tab_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }
}

fn load_members(conn: &Connection, group_id: &str) -> PersistenceResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT tab_id
         FROM group_members
         WHERE group_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([group_id])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        members.push(row.get(0)?);
    }
    Ok(members)
}

fn put_state<T: Serialize>(tx: &Transaction<'_>, key: &str, value: &T) -> PersistenceResult<()> {
    let encoded = serde_json::to_string(value)?;
    tx.execute(
        "INSERT INTO app_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![key, encoded],
    )?;
    Ok(())
}

fn get_state<T: DeserializeOwned>(conn: &Connection, key: &str) -> PersistenceResult<Option<T>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM app_state WHERE key = ?1;",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}
