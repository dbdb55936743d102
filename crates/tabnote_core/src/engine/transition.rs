//! Reducer mapping `(snapshot, command)` to the next snapshot.
//!
//! # Invariants
//! - Total: every command yields a defined snapshot. Unknown commands and
//!   commands naming missing ids return the input unchanged.
//! - Never fails and never performs I/O.
//! - Every output has at least one tab, consistent membership, no group
//!   emptied by a tab deletion and a bounded history.
//! - The active tab exists on every output except directly after
//!   `SetActiveTab` with a dangling id.

use std::collections::HashSet;

use crate::engine::command::{Command, GroupFilterToggle};
use crate::engine::env::{format_timestamp, TransitionEnv};
use crate::engine::membership;
use crate::engine::rebalance::rebalance_after_delete;
use crate::model::action_log::{kinds, ActionLog, ActionLogEntry};
use crate::model::group::{normalize_group, Group, GroupPatch};
use crate::model::settings::SettingsPatch;
use crate::model::snapshot::{Snapshot, SnapshotPatch};
use crate::model::tab::{normalize_tab, Tab, TabPatch};

/// Applies `command` to `snapshot`.
pub fn transition(snapshot: &Snapshot, command: Command, env: &mut dyn TransitionEnv) -> Snapshot {
    match command {
        Command::CreateTab(tab) => create_tab(snapshot, tab, env),
        Command::UpdateTab { id, patch } => update_tab(snapshot, &id, patch, env),
        Command::DeleteTab(id) => delete_tab(snapshot, &id, env),
        Command::SetActiveTab(id) => Snapshot {
            active_tab_id: id,
            ..snapshot.clone()
        },
        Command::CreateGroup(group) => create_group(snapshot, group, env),
        Command::UpdateGroup { id, patch } => update_group(snapshot, &id, patch),
        Command::DeleteGroup(id) => delete_group(snapshot, &id, env),
        Command::ToggleGroupFilter(target) => toggle_group_filter(snapshot, target),
        Command::UpdateSettings(patch) => update_settings(snapshot, patch, env),
        Command::AppendLogEntry { kind, description } => {
            let mut next = snapshot.clone();
            record(&mut next, env, &kind, description);
            next
        }
        Command::LoadSnapshot(patch) => load_snapshot(snapshot, patch, env),
        Command::ToggleSecretVisibility(visible) => Snapshot {
            secret_tab_visible: visible,
            ..snapshot.clone()
        },
        Command::ToggleAiPrompt(open) => Snapshot {
            is_ai_prompt_open: open.unwrap_or(!snapshot.is_ai_prompt_open),
            ..snapshot.clone()
        },
        Command::ToggleHistory(open) => Snapshot {
            is_history_open: open.unwrap_or(!snapshot.is_history_open),
            ..snapshot.clone()
        },
        Command::ClearHistory => Snapshot {
            history: ActionLog::new(),
            ..snapshot.clone()
        },
        Command::Unknown => snapshot.clone(),
    }
}

/// Builds the tab the tab strip's "new tab" button creates.
///
/// When exactly one group filter is active the tab is placed in that group.
pub fn draft_new_tab(snapshot: &Snapshot, env: &mut dyn TransitionEnv) -> Tab {
    let mut tab = Tab::untitled(env.next_id("tab"), env.now_ms());
    if let [only] = snapshot.active_group_filters.as_slice() {
        tab.group_id = Some(only.clone());
    }
    tab
}

fn create_tab(snapshot: &Snapshot, tab: Tab, env: &mut dyn TransitionEnv) -> Snapshot {
    let mut tab = normalize_tab(tab);
    let target = tab.group_id.take();
    let tab_id = tab.id.clone();
    let description = format!("Created tab \"{}\"", tab.name);

    let mut next = snapshot.clone();
    next.tabs.push(tab);
    membership::assign(&mut next, &tab_id, target.as_deref());
    next.active_tab_id = Some(tab_id);
    record(&mut next, env, kinds::CREATE_TAB, description);
    next
}

fn update_tab(
    snapshot: &Snapshot,
    id: &str,
    patch: TabPatch,
    env: &mut dyn TransitionEnv,
) -> Snapshot {
    let Some(previous_name) = snapshot.tab(id).map(|tab| tab.name.clone()) else {
        return snapshot.clone();
    };

    let mut next = snapshot.clone();
    if let Some(tab) = next.tabs.iter_mut().find(|tab| tab.id == id) {
        patch.apply_fields(tab);
    }
    if let Some(target) = &patch.group_id {
        membership::assign(&mut next, id, target.as_deref());
    }

    if let Some(name) = patch.name.as_deref() {
        if name != previous_name {
            record(
                &mut next,
                env,
                kinds::RENAME_TAB,
                format!("Renamed tab from \"{previous_name}\" to \"{name}\""),
            );
        }
    }
    next
}

fn delete_tab(snapshot: &Snapshot, id: &str, env: &mut dyn TransitionEnv) -> Snapshot {
    let Some(deleted) = snapshot.tab(id).cloned() else {
        return snapshot.clone();
    };

    let mut pruned = snapshot.clone();
    pruned.tabs.retain(|tab| tab.id != id);
    membership::detach(&mut pruned, id);

    let rebalanced = rebalance_after_delete(pruned, &deleted, env);
    let mut next = rebalanced.snapshot;

    if snapshot.active_tab_id.as_deref() == Some(id) {
        // Fallback is the last tab in order; only stable under a single writer.
        next.active_tab_id = rebalanced
            .placeholder
            .or_else(|| next.tabs.last().map(|tab| tab.id.clone()));
    }

    record(
        &mut next,
        env,
        kinds::DELETE_TAB,
        format!("Deleted tab \"{}\"", deleted.name),
    );
    next
}

fn create_group(snapshot: &Snapshot, group: Group, env: &mut dyn TransitionEnv) -> Snapshot {
    let mut group = normalize_group(group);
    let requested = std::mem::take(&mut group.tab_ids);
    let group_id = group.id.clone();
    let description = format!("Created group \"{}\"", group.name);

    let mut next = snapshot.clone();
    next.groups.push(group);
    membership::set_members(&mut next, &group_id, &requested);
    record(&mut next, env, kinds::CREATE_GROUP, description);
    next
}

fn update_group(snapshot: &Snapshot, id: &str, patch: GroupPatch) -> Snapshot {
    if snapshot.group(id).is_none() {
        return snapshot.clone();
    }

    let mut next = snapshot.clone();
    if let Some(group) = next.groups.iter_mut().find(|group| group.id == id) {
        patch.apply_fields(group);
    }
    if let Some(tab_ids) = &patch.tab_ids {
        membership::set_members(&mut next, id, tab_ids);
    }
    next
}

fn delete_group(snapshot: &Snapshot, id: &str, env: &mut dyn TransitionEnv) -> Snapshot {
    if snapshot.group(id).is_none() {
        return snapshot.clone();
    }

    let mut next = snapshot.clone();
    membership::dissolve(&mut next, id);
    next.groups.retain(|group| group.id != id);
    next.active_group_filters.retain(|filter| filter != id);
    // Legacy message: the group name is not included.
    record(&mut next, env, kinds::DELETE_GROUP, "Deleted group".to_string());
    next
}

fn toggle_group_filter(snapshot: &Snapshot, target: GroupFilterToggle) -> Snapshot {
    let mut next = snapshot.clone();
    match target {
        GroupFilterToggle::ResetAll => next.active_group_filters.clear(),
        GroupFilterToggle::Group(group_id) => {
            if next.active_group_filters.contains(&group_id) {
                next.active_group_filters.retain(|filter| *filter != group_id);
            } else {
                next.active_group_filters.push(group_id);
            }
        }
    }
    next
}

fn update_settings(
    snapshot: &Snapshot,
    patch: SettingsPatch,
    env: &mut dyn TransitionEnv,
) -> Snapshot {
    let mut next = snapshot.clone();
    next.settings = patch.merged_over(&snapshot.settings);
    record(&mut next, env, kinds::SETTINGS, patch.describe());
    next
}

fn load_snapshot(
    snapshot: &Snapshot,
    patch: SnapshotPatch,
    env: &mut dyn TransitionEnv,
) -> Snapshot {
    let mut next = snapshot.clone();
    if let Some(tabs) = patch.tabs {
        let mut seen = HashSet::new();
        next.tabs = tabs
            .into_iter()
            .map(normalize_tab)
            .filter(|tab| seen.insert(tab.id.clone()))
            .collect();
    }
    if let Some(groups) = patch.groups {
        let mut seen = HashSet::new();
        next.groups = groups
            .into_iter()
            .map(normalize_group)
            .filter(|group| seen.insert(group.id.clone()))
            .collect();
    }
    if let Some(active) = patch.active_tab_id {
        next.active_tab_id = active;
    }
    if let Some(filters) = patch.active_group_filters {
        next.active_group_filters = filters;
    }
    if let Some(settings) = patch.settings {
        next.settings = settings;
    }
    if let Some(history) = patch.history {
        next.history = ActionLog::from_entries(history);
    }

    repair(&mut next, env);
    next
}

/// Re-establishes invariants on wholesale-loaded data.
fn repair(snapshot: &mut Snapshot, env: &mut dyn TransitionEnv) {
    membership::rebuild(snapshot);

    let mut seen = HashSet::new();
    let groups: HashSet<String> = snapshot.groups.iter().map(|g| g.id.clone()).collect();
    snapshot
        .active_group_filters
        .retain(|filter| groups.contains(filter) && seen.insert(filter.clone()));

    if snapshot.tabs.is_empty() {
        let tab = Tab::untitled(env.next_id("tab"), env.now_ms());
        snapshot.active_tab_id = Some(tab.id.clone());
        snapshot.tabs.push(tab);
    }

    let dangling = snapshot
        .active_tab_id
        .as_deref()
        .is_some_and(|id| snapshot.tab(id).is_none());
    if dangling {
        snapshot.active_tab_id = snapshot.tabs.last().map(|tab| tab.id.clone());
    }
}

fn record(snapshot: &mut Snapshot, env: &mut dyn TransitionEnv, kind: &str, description: String) {
    let entry = ActionLogEntry {
        id: env.next_id("log"),
        kind: kind.to_string(),
        description,
        timestamp: format_timestamp(env.now_ms()),
    };
    snapshot.history.push(entry);
}
