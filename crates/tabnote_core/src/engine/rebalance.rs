//! Self-healing after tab deletion.
//!
//! # Invariants
//! - A group never ends up empty as the direct result of a deletion: a
//!   placeholder tab named after the group is materialized first.
//! - The tab set never ends up empty: an ungrouped `Untitled` placeholder
//!   is materialized.
//! - Placeholders always get fresh ids so callers can tell them apart
//!   from pre-existing tabs.

use crate::engine::env::TransitionEnv;
use crate::model::snapshot::Snapshot;
use crate::model::tab::{Tab, TabId, DEFAULT_TAB_COLOR};

/// Result of [`rebalance_after_delete`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rebalanced {
    pub snapshot: Snapshot,
    /// Id of the placeholder tab created, if any.
    pub placeholder: Option<TabId>,
}

/// Keeps the tab set and the deleted tab's group non-empty once `deleted`
/// has been removed from `snapshot`.
///
/// Expects `deleted` to be gone from both `tabs` and every `tab_ids` list.
pub fn rebalance_after_delete(
    mut snapshot: Snapshot,
    deleted: &Tab,
    env: &mut dyn TransitionEnv,
) -> Rebalanced {
    let mut placeholder = None;

    if let Some(group_id) = deleted.group_id.as_deref() {
        let orphaned = snapshot.group(group_id).is_some()
            && !snapshot.tabs.iter().any(|tab| tab.belongs_to(group_id));
        if orphaned {
            let tab_id = env.next_id("tab");
            let created_at = env.now_ms();
            if let Some(group) = snapshot.groups.iter_mut().find(|g| g.id == group_id) {
                let mut tab = Tab::untitled(tab_id.clone(), created_at);
                tab.name = group.name.clone();
                tab.color = if group.color.trim().is_empty() {
                    DEFAULT_TAB_COLOR.to_string()
                } else {
                    group.color.clone()
                };
                tab.group_id = Some(group.id.clone());
                group.tab_ids.push(tab_id.clone());
                snapshot.tabs.push(tab);
                placeholder = Some(tab_id);
            }
        }
    }

    if snapshot.tabs.is_empty() {
        let tab_id = env.next_id("tab");
        let created_at = env.now_ms();
        snapshot.tabs.push(Tab::untitled(tab_id.clone(), created_at));
        placeholder = Some(tab_id);
    }

    Rebalanced {
        snapshot,
        placeholder,
    }
}
