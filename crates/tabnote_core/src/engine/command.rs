//! Commands accepted by the transition engine.
//!
//! Commands travel from the UI as `{"type": "...", "payload": ...}`
//! documents. Unknown `type` tags decode to [`Command::Unknown`], which the
//! engine treats as a no-op.

use serde::{Deserialize, Serialize};

use crate::model::group::{Group, GroupId, GroupPatch};
use crate::model::settings::SettingsPatch;
use crate::model::snapshot::SnapshotPatch;
use crate::model::tab::{Tab, TabId, TabPatch};

/// Sentinel filter value that clears every active group filter.
pub const RESET_ALL_FILTERS: &str = "ALL_RESET";

/// One state-changing request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Appends a tab and makes it active. The caller supplies a unique id.
    CreateTab(Tab),
    UpdateTab {
        id: TabId,
        patch: TabPatch,
    },
    DeleteTab(TabId),
    /// Unconditional selection change; the id is not validated.
    SetActiveTab(Option<TabId>),
    CreateGroup(Group),
    UpdateGroup {
        id: GroupId,
        patch: GroupPatch,
    },
    DeleteGroup(GroupId),
    ToggleGroupFilter(GroupFilterToggle),
    UpdateSettings(SettingsPatch),
    /// Records a description computed by a collaborator.
    AppendLogEntry {
        #[serde(rename = "type")]
        kind: String,
        description: String,
    },
    /// Replaces the provided top-level fields wholesale.
    LoadSnapshot(SnapshotPatch),
    ToggleSecretVisibility(bool),
    /// `None` flips the current value.
    ToggleAiPrompt(Option<bool>),
    /// `None` flips the current value.
    ToggleHistory(Option<bool>),
    ClearHistory,
    #[serde(other)]
    Unknown,
}

impl Command {
    /// Decodes one UI command document.
    ///
    /// A document whose tag is unknown decodes to [`Command::Unknown`] even
    /// when it carries a payload; a known tag with a malformed payload is an
    /// error.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        match serde_json::from_value::<Self>(value.clone()) {
            Ok(command) => Ok(command),
            Err(err) => {
                let tag_only = serde_json::json!({ "type": value.get("type") });
                match serde_json::from_value::<Self>(tag_only) {
                    Ok(Self::Unknown) => Ok(Self::Unknown),
                    _ => Err(err),
                }
            }
        }
    }

    /// Stable tag used in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CreateTab(_) => "create_tab",
            Self::UpdateTab { .. } => "update_tab",
            Self::DeleteTab(_) => "delete_tab",
            Self::SetActiveTab(_) => "set_active_tab",
            Self::CreateGroup(_) => "create_group",
            Self::UpdateGroup { .. } => "update_group",
            Self::DeleteGroup(_) => "delete_group",
            Self::ToggleGroupFilter(_) => "toggle_group_filter",
            Self::UpdateSettings(_) => "update_settings",
            Self::AppendLogEntry { .. } => "append_log_entry",
            Self::LoadSnapshot(_) => "load_snapshot",
            Self::ToggleSecretVisibility(_) => "toggle_secret_visibility",
            Self::ToggleAiPrompt(_) => "toggle_ai_prompt",
            Self::ToggleHistory(_) => "toggle_history",
            Self::ClearHistory => "clear_history",
            Self::Unknown => "unknown",
        }
    }

    /// Shorthand for [`Command::AppendLogEntry`].
    pub fn log(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self::AppendLogEntry {
            kind: kind.into(),
            description: description.into(),
        }
    }
}

/// Target of a group filter toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GroupFilterToggle {
    Group(GroupId),
    ResetAll,
}

impl From<String> for GroupFilterToggle {
    fn from(value: String) -> Self {
        if value == RESET_ALL_FILTERS {
            Self::ResetAll
        } else {
            Self::Group(value)
        }
    }
}

impl From<GroupFilterToggle> for String {
    fn from(value: GroupFilterToggle) -> Self {
        match value {
            GroupFilterToggle::Group(id) => id,
            GroupFilterToggle::ResetAll => RESET_ALL_FILTERS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, GroupFilterToggle};

    #[test]
    fn decodes_tagged_documents() {
        let command = Command::from_json(r#"{"type":"DELETE_TAB","payload":"tab-1"}"#).unwrap();
        assert_eq!(command, Command::DeleteTab("tab-1".to_string()));

        let command =
            Command::from_json(r#"{"type":"TOGGLE_GROUP_FILTER","payload":"ALL_RESET"}"#)
                .unwrap();
        assert_eq!(
            command,
            Command::ToggleGroupFilter(GroupFilterToggle::ResetAll)
        );

        let command = Command::from_json(
            r#"{"type":"UPDATE_TAB","payload":{"id":"tab-1","patch":{"name":"Notes"}}}"#,
        )
        .unwrap();
        assert!(matches!(command, Command::UpdateTab { ref id, .. } if id == "tab-1"));
    }

    #[test]
    fn unknown_tag_decodes_to_unknown() {
        let command = Command::from_json(r#"{"type":"LAUNCH_ROCKET","payload":1}"#).unwrap();
        assert_eq!(command, Command::Unknown);
    }

    #[test]
    fn known_tag_with_bad_payload_is_an_error() {
        assert!(Command::from_json(r#"{"type":"DELETE_TAB","payload":{"x":1}}"#).is_err());
    }

    #[test]
    fn unit_and_optional_payloads_decode() {
        assert_eq!(
            Command::from_json(r#"{"type":"CLEAR_HISTORY"}"#).unwrap(),
            Command::ClearHistory
        );
        assert_eq!(
            Command::from_json(r#"{"type":"SET_ACTIVE_TAB","payload":null}"#).unwrap(),
            Command::SetActiveTab(None)
        );
    }

    #[test]
    fn log_entry_payload_uses_type_key() {
        let value = serde_json::to_value(Command::log("save_cloud", "Saved to cloud")).unwrap();
        assert_eq!(value["type"], "APPEND_LOG_ENTRY");
        assert_eq!(value["payload"]["type"], "save_cloud");
    }
}
