//! Group domain model.
//!
//! # Invariants
//! - `tab_ids` mirrors the set of tabs whose `group_id` equals `id`.
//!   The list is denormalized for group-scoped listing; only the
//!   membership helpers in `engine::membership` may change it.

use serde::{Deserialize, Serialize};

use super::tab::{TabId, DEFAULT_TAB_COLOR};

/// Stable group identifier (`group-...`).
pub type GroupId = String;

/// Icon used when a group is created without one.
pub const DEFAULT_GROUP_ICON: &str = "📁";
/// Display name used when a group is created with a blank name.
pub const DEFAULT_GROUP_NAME: &str = "Group";

/// Named collection of tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    #[serde(default = "default_group_name")]
    pub name: String,
    #[serde(default = "default_group_color")]
    pub color: String,
    #[serde(default = "default_group_icon")]
    pub icon: String,
    #[serde(default)]
    pub order: i64,
    /// Ordered member list.
    #[serde(default)]
    pub tab_ids: Vec<TabId>,
}

impl Group {
    /// Creates an empty group with default color and icon.
    pub fn new(id: impl Into<GroupId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: DEFAULT_TAB_COLOR.to_string(),
            icon: DEFAULT_GROUP_ICON.to_string(),
            order: 0,
            tab_ids: Vec::new(),
        }
    }

    pub fn contains(&self, tab_id: &str) -> bool {
        self.tab_ids.iter().any(|id| id == tab_id)
    }
}

/// Partial group update. `tab_ids`, when present, replaces the membership.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_ids: Option<Vec<TabId>>,
}

impl GroupPatch {
    pub(crate) fn apply_fields(&self, group: &mut Group) {
        if let Some(name) = &self.name {
            group.name = name.clone();
        }
        if let Some(color) = &self.color {
            group.color = color.clone();
        }
        if let Some(icon) = &self.icon {
            group.icon = icon.clone();
        }
        if let Some(order) = self.order {
            group.order = order;
        }
    }
}

/// Fills blank required fields and removes duplicate member ids.
pub fn normalize_group(mut group: Group) -> Group {
    if group.name.trim().is_empty() {
        group.name = DEFAULT_GROUP_NAME.to_string();
    }
    if group.color.trim().is_empty() {
        group.color = DEFAULT_TAB_COLOR.to_string();
    }
    if group.icon.trim().is_empty() {
        group.icon = DEFAULT_GROUP_ICON.to_string();
    }
    let mut seen = std::collections::HashSet::new();
    group.tab_ids.retain(|id| seen.insert(id.clone()));
    group
}

fn default_group_name() -> String {
    DEFAULT_GROUP_NAME.to_string()
}

fn default_group_color() -> String {
    DEFAULT_TAB_COLOR.to_string()
}

fn default_group_icon() -> String {
    DEFAULT_GROUP_ICON.to_string()
}

#[cfg(test)]
mod tests {
    use super::{normalize_group, Group, DEFAULT_GROUP_ICON};

    #[test]
    fn normalize_deduplicates_members_keeping_first_position() {
        let mut group = Group::new("g-1", "Work");
        group.tab_ids = vec!["a".into(), "b".into(), "a".into()];
        let normalized = normalize_group(group);
        assert_eq!(normalized.tab_ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn blank_icon_falls_back_to_default() {
        let mut group = Group::new("g-1", "Work");
        group.icon = " ".to_string();
        assert_eq!(normalize_group(group).icon, DEFAULT_GROUP_ICON);
    }

    #[test]
    fn deserializes_partial_shape() {
        let group: Group = serde_json::from_str(r#"{"id":"g-1","name":"Work"}"#).unwrap();
        assert!(group.tab_ids.is_empty());
        assert_eq!(group.order, 0);
    }
}
