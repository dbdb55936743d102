//! Tab domain model.
//!
//! # Responsibility
//! - Define the writable note surface shown in the tab strip.
//! - Default missing or blank fields instead of rejecting input.
//!
//! # Invariants
//! - `id` is stable and never reused for another tab.
//! - `group_id`, when set, references an existing group (enforced by the
//!   transition engine, not by this type).

use serde::{Deserialize, Serialize};

/// Stable tab identifier (`tab-...`).
pub type TabId = String;

/// Fallback color for tabs created without one.
pub const DEFAULT_TAB_COLOR: &str = "#333333";
/// Display name for fresh, unnamed tabs.
pub const DEFAULT_TAB_NAME: &str = "Untitled";

/// One named note.
///
/// Serialized camelCase so stored and backed-up documents keep the legacy
/// field names (`groupId`, `scrollPosition`, `createdAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    #[serde(default = "default_tab_name")]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_tab_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_position: Option<f64>,
    /// Unix epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
}

impl Tab {
    /// Creates an empty, ungrouped `Untitled` tab.
    pub fn untitled(id: impl Into<TabId>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            name: DEFAULT_TAB_NAME.to_string(),
            content: String::new(),
            color: DEFAULT_TAB_COLOR.to_string(),
            group_id: None,
            scroll_position: None,
            created_at,
        }
    }

    /// Returns whether this tab is a member of `group_id`.
    pub fn belongs_to(&self, group_id: &str) -> bool {
        self.group_id.as_deref() == Some(group_id)
    }
}

/// Partial tab update.
///
/// `group_id` and `scroll_position` are double options: absent leaves the
/// field alone, `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub group_id: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::double_option"
    )]
    pub scroll_position: Option<Option<f64>>,
}

impl TabPatch {
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            name: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn content(value: impl Into<String>) -> Self {
        Self {
            content: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn group(group_id: Option<String>) -> Self {
        Self {
            group_id: Some(group_id),
            ..Self::default()
        }
    }

    /// Merges non-membership fields into `tab`.
    ///
    /// `group_id` is not applied here; membership changes go
    /// through `engine::membership` so both sides stay in sync.
    pub(crate) fn apply_fields(&self, tab: &mut Tab) {
        if let Some(name) = &self.name {
            tab.name = name.clone();
        }
        if let Some(content) = &self.content {
            tab.content = content.clone();
        }
        if let Some(color) = &self.color {
            tab.color = color.clone();
        }
        if let Some(scroll) = self.scroll_position {
            tab.scroll_position = scroll;
        }
    }
}

/// Fills blank required fields with defaults.
pub fn normalize_tab(mut tab: Tab) -> Tab {
    if tab.name.trim().is_empty() {
        tab.name = DEFAULT_TAB_NAME.to_string();
    }
    if tab.color.trim().is_empty() {
        tab.color = DEFAULT_TAB_COLOR.to_string();
    }
    if tab
        .group_id
        .as_deref()
        .is_some_and(|value| value.trim().is_empty())
    {
        tab.group_id = None;
    }
    tab
}

fn default_tab_name() -> String {
    DEFAULT_TAB_NAME.to_string()
}

fn default_tab_color() -> String {
    DEFAULT_TAB_COLOR.to_string()
}

#[cfg(test)]
mod tests {
    use super::{normalize_tab, Tab, TabPatch, DEFAULT_TAB_COLOR, DEFAULT_TAB_NAME};

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let tab: Tab = serde_json::from_str(r#"{"id":"tab-1"}"#).unwrap();
        assert_eq!(tab.name, DEFAULT_TAB_NAME);
        assert_eq!(tab.color, DEFAULT_TAB_COLOR);
        assert_eq!(tab.content, "");
        assert_eq!(tab.group_id, None);
    }

    #[test]
    fn normalize_replaces_blank_values() {
        let mut tab = Tab::untitled("tab-1", 0);
        tab.name = "  ".to_string();
        tab.color = String::new();
        tab.group_id = Some(String::new());

        let normalized = normalize_tab(tab);
        assert_eq!(normalized.name, DEFAULT_TAB_NAME);
        assert_eq!(normalized.color, DEFAULT_TAB_COLOR);
        assert_eq!(normalized.group_id, None);
    }

    #[test]
    fn patch_distinguishes_absent_and_null_group() {
        let absent: TabPatch = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(absent.group_id, None);

        let cleared: TabPatch = serde_json::from_str(r#"{"groupId":null}"#).unwrap();
        assert_eq!(cleared.group_id, Some(None));

        let set: TabPatch = serde_json::from_str(r#"{"groupId":"g-1"}"#).unwrap();
        assert_eq!(set.group_id, Some(Some("g-1".to_string())));
    }

    #[test]
    fn serialized_tab_uses_legacy_field_names() {
        let mut tab = Tab::untitled("tab-1", 42);
        tab.group_id = Some("g-1".to_string());
        let value = serde_json::to_value(&tab).unwrap();
        assert_eq!(value["groupId"], "g-1");
        assert_eq!(value["createdAt"], 42);
        assert!(value.get("scrollPosition").is_none());
    }
}
