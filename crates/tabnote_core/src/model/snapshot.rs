//! Whole-application snapshot and its invariant checker.
//!
//! # Responsibility
//! - Hold every entity plus UI selection state in one immutable value.
//! - Provide view-only projections (filtered tabs, visible groups).
//! - Detect invariant violations for tests and debug assertions.
//!
//! # Invariants
//! - At least one tab exists once the store is initialized.
//! - `active_tab_id`, when set, references a present tab.
//! - Each group's `tab_ids` equals the set of tabs pointing at it, and
//!   no tab points at a missing group.
//! - History holds at most `HISTORY_LIMIT` entries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::action_log::{ActionLog, ActionLogEntry, HISTORY_LIMIT};
use super::group::{Group, GroupId};
use super::settings::Settings;
use super::tab::{Tab, TabId};

/// Name of the group hidden from the group bar and excluded from backups.
pub const DEFAULT_PRIVATE_GROUP_NAME: &str = "Recipe";

/// Immutable application state published by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub tabs: Vec<Tab>,
    pub groups: Vec<Group>,
    pub active_tab_id: Option<TabId>,
    /// Ordered set of group ids used for view-level filtering.
    pub active_group_filters: Vec<GroupId>,
    pub settings: Settings,
    pub history: ActionLog,
    pub secret_tab_visible: bool,
    pub is_ai_prompt_open: bool,
    pub is_history_open: bool,
}

impl Snapshot {
    pub fn tab(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active_tab_id.as_deref().and_then(|id| self.tab(id))
    }

    /// Finds the first group carrying `name`.
    pub fn group_named(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Tabs shown in the tab strip under the active group filters.
    ///
    /// With no filters every tab is visible; otherwise only tabs whose
    /// group is one of the filters. Filtering never changes membership.
    pub fn visible_tabs(&self) -> Vec<&Tab> {
        if self.active_group_filters.is_empty() {
            return self.tabs.iter().collect();
        }
        self.tabs
            .iter()
            .filter(|tab| {
                tab.group_id
                    .as_ref()
                    .is_some_and(|group_id| self.active_group_filters.contains(group_id))
            })
            .collect()
    }

    /// Groups shown in the group bar; the private group stays hidden until
    /// `secret_tab_visible` is set.
    pub fn visible_groups(&self, private_group_name: &str) -> Vec<&Group> {
        self.groups
            .iter()
            .filter(|group| self.secret_tab_visible || group.name != private_group_name)
            .collect()
    }

    /// Returns the first violated invariant, if any.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if self.tabs.is_empty() {
            return Err(InvariantViolation::NoTabs);
        }
        if let Some(active) = self.dangling_selection() {
            return Err(InvariantViolation::DanglingActiveTab(active.to_string()));
        }
        self.check_invariants_except_selection()
    }

    /// Active tab id that names no present tab, if any.
    ///
    /// `SetActiveTab` stores its id unvalidated, so a dangling selection
    /// survives later commands until another selection or a load replaces
    /// it.
    pub fn dangling_selection(&self) -> Option<&str> {
        self.active_tab_id
            .as_deref()
            .filter(|active| self.tab(active).is_none())
    }

    /// Like [`Snapshot::check_invariants`] but tolerates a dangling active
    /// tab id.
    pub fn check_invariants_except_selection(&self) -> Result<(), InvariantViolation> {
        if self.tabs.is_empty() {
            return Err(InvariantViolation::NoTabs);
        }

        let group_ids: HashSet<&str> = self.groups.iter().map(|g| g.id.as_str()).collect();
        for tab in &self.tabs {
            if let Some(group_id) = &tab.group_id {
                if !group_ids.contains(group_id.as_str()) {
                    return Err(InvariantViolation::DanglingGroupRef {
                        tab_id: tab.id.clone(),
                        group_id: group_id.clone(),
                    });
                }
            }
        }

        for group in &self.groups {
            let listed: BTreeSet<&str> = group.tab_ids.iter().map(String::as_str).collect();
            let derived: BTreeSet<&str> = self
                .tabs
                .iter()
                .filter(|tab| tab.belongs_to(&group.id))
                .map(|tab| tab.id.as_str())
                .collect();
            if listed != derived || listed.len() != group.tab_ids.len() {
                return Err(InvariantViolation::MembershipMismatch {
                    group_id: group.id.clone(),
                });
            }
        }

        if self.history.len() > HISTORY_LIMIT {
            return Err(InvariantViolation::HistoryOverflow(self.history.len()));
        }

        Ok(())
    }
}

/// Partial snapshot used for startup rehydration and cloud restore.
///
/// Only present fields replace the current snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<Tab>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub active_tab_id: Option<Option<TabId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_group_filters: Option<Vec<GroupId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ActionLogEntry>>,
}

impl SnapshotPatch {
    /// Returns whether the patch carries no data at all.
    pub fn is_empty(&self) -> bool {
        self.tabs.as_ref().map_or(true, Vec::is_empty)
            && self.groups.is_none()
            && self.active_tab_id.is_none()
            && self.active_group_filters.is_none()
            && self.settings.is_none()
            && self.history.is_none()
    }
}

/// Invariant violation. Always a programming error, never recovered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    NoTabs,
    DanglingActiveTab(TabId),
    DanglingGroupRef { tab_id: TabId, group_id: GroupId },
    MembershipMismatch { group_id: GroupId },
    HistoryOverflow(usize),
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTabs => write!(f, "tab set is empty"),
            Self::DanglingActiveTab(id) => write!(f, "active tab `{id}` does not exist"),
            Self::DanglingGroupRef { tab_id, group_id } => {
                write!(f, "tab `{tab_id}` references missing group `{group_id}`")
            }
            Self::MembershipMismatch { group_id } => {
                write!(f, "group `{group_id}` tab_ids disagree with tab.group_id")
            }
            Self::HistoryOverflow(len) => {
                write!(f, "history holds {len} entries, limit is {HISTORY_LIMIT}")
            }
        }
    }
}

impl Error for InvariantViolation {}
