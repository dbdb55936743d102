//! Tab/group membership relation.
//!
//! `Tab::group_id` and `Group::tab_ids` describe the same relation twice.
//! Every transition that touches membership goes through this module, which
//! updates both sides together.

use std::collections::HashSet;

use crate::model::snapshot::Snapshot;

/// Moves `tab_id` into `target`, or out of every group when `target` is
/// `None`. A target naming a missing group is treated as `None`.
///
/// Keeps the tab's position when it already belongs to `target`.
pub(crate) fn assign(snapshot: &mut Snapshot, tab_id: &str, target: Option<&str>) {
    let target = target.filter(|group_id| snapshot.group(group_id).is_some());
    let Some(tab) = snapshot.tabs.iter_mut().find(|tab| tab.id == tab_id) else {
        return;
    };

    let already_member = match target {
        Some(group_id) => {
            tab.belongs_to(group_id)
                && snapshot
                    .groups
                    .iter()
                    .any(|group| group.id == group_id && group.contains(tab_id))
        }
        None => false,
    };
    if already_member {
        return;
    }

    tab.group_id = target.map(str::to_string);
    detach(snapshot, tab_id);
    if let Some(group_id) = target {
        if let Some(group) = snapshot.groups.iter_mut().find(|g| g.id == group_id) {
            group.tab_ids.push(tab_id.to_string());
        }
    }
}

/// Removes `tab_id` from every group's member list.
pub(crate) fn detach(snapshot: &mut Snapshot, tab_id: &str) {
    for group in &mut snapshot.groups {
        group.tab_ids.retain(|id| id != tab_id);
    }
}

/// Ungroups every member of `group_id` without deleting any tab.
pub(crate) fn dissolve(snapshot: &mut Snapshot, group_id: &str) {
    for tab in &mut snapshot.tabs {
        if tab.belongs_to(group_id) {
            tab.group_id = None;
        }
    }
    if let Some(group) = snapshot.groups.iter_mut().find(|g| g.id == group_id) {
        group.tab_ids.clear();
    }
}

/// Replaces the member list of `group_id` with the existing tabs in
/// `tab_ids`, in that order. Tabs dropped from the list become ungrouped;
/// tabs taken from another group leave it.
pub(crate) fn set_members(snapshot: &mut Snapshot, group_id: &str, tab_ids: &[String]) {
    if snapshot.group(group_id).is_none() {
        return;
    }
    let wanted: HashSet<&str> = tab_ids.iter().map(String::as_str).collect();

    let leaving: Vec<String> = snapshot
        .tabs
        .iter()
        .filter(|tab| tab.belongs_to(group_id) && !wanted.contains(tab.id.as_str()))
        .map(|tab| tab.id.clone())
        .collect();
    for tab_id in &leaving {
        assign(snapshot, tab_id, None);
    }
    for tab_id in tab_ids {
        assign(snapshot, tab_id, Some(group_id));
    }

    let mut seen = HashSet::new();
    let ordered: Vec<String> = tab_ids
        .iter()
        .filter(|id| {
            snapshot
                .tab(id)
                .is_some_and(|tab| tab.belongs_to(group_id))
        })
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    if let Some(group) = snapshot.groups.iter_mut().find(|g| g.id == group_id) {
        group.tab_ids = ordered;
    }
}

/// Rebuilds every member list from `Tab::group_id`.
///
/// Used after wholesale loads where the two sides may disagree. Tab-side
/// references are authoritative: dangling ones are cleared, stored list
/// order is kept for valid entries and unlisted members are appended in
/// tab order.
pub(crate) fn rebuild(snapshot: &mut Snapshot) {
    let group_ids: HashSet<String> = snapshot.groups.iter().map(|g| g.id.clone()).collect();
    for tab in &mut snapshot.tabs {
        if tab
            .group_id
            .as_ref()
            .is_some_and(|group_id| !group_ids.contains(group_id))
        {
            tab.group_id = None;
        }
    }

    let tabs = &snapshot.tabs;
    for group in &mut snapshot.groups {
        let mut seen = HashSet::new();
        let mut members: Vec<String> = group
            .tab_ids
            .iter()
            .filter(|id| {
                tabs.iter()
                    .any(|tab| &tab.id == *id && tab.belongs_to(&group.id))
            })
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();
        for tab in tabs.iter().filter(|tab| tab.belongs_to(&group.id)) {
            if seen.insert(tab.id.clone()) {
                members.push(tab.id.clone());
            }
        }
        group.tab_ids = members;
    }
}
