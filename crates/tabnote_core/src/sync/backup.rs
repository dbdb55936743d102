//! Cloud backup document.
//!
//! # Invariants
//! - The private group, its tabs, its filter entry and a private active
//!   tab never appear in a backup.
//! - The four legacy display keys are duplicated at the document root and
//!   win over the nested `settings` on restore.

use serde::{Deserialize, Serialize};

use crate::model::group::Group;
use crate::model::settings::{LegacySettingsFields, SettingsPatch};
use crate::model::snapshot::{Snapshot, SnapshotPatch};
use crate::model::tab::{Tab, TabId};
use crate::persistence::{PersistenceBridge, PersistenceResult};

/// Document stored by cloud providers. Field names match older clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    #[serde(default)]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub groups: Vec<Group>,
    /// May be partial in documents written by older clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsPatch>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub active_tab: Option<TabId>,
    #[serde(default)]
    pub active_group_filters: Vec<String>,
    #[serde(flatten)]
    pub legacy: LegacySettingsFields,
}

/// Builds the backup for `snapshot`.
///
/// Tab content is read from the content store when it holds a non-empty
/// value, falling back to the snapshot copy.
pub fn build_backup<P: PersistenceBridge + ?Sized>(
    snapshot: &Snapshot,
    contents: &P,
    private_group_name: &str,
    timestamp: String,
) -> PersistenceResult<BackupData> {
    let private_id = snapshot
        .group_named(private_group_name)
        .map(|group| group.id.as_str());
    let is_private = |group_id: Option<&str>| private_id.is_some() && group_id == private_id;

    let mut tabs = Vec::new();
    for tab in &snapshot.tabs {
        if is_private(tab.group_id.as_deref()) {
            continue;
        }
        let mut tab = tab.clone();
        if let Some(stored) = contents.load_content(&tab.id)? {
            if !stored.is_empty() {
                tab.content = stored;
            }
        }
        tabs.push(tab);
    }

    let groups = snapshot
        .groups
        .iter()
        .filter(|group| !is_private(Some(group.id.as_str())))
        .map(|group| {
            let mut group = group.clone();
            group
                .tab_ids
                .retain(|id| tabs.iter().any(|tab| &tab.id == id));
            group
        })
        .collect();

    let active_tab = snapshot
        .active_tab_id
        .clone()
        .filter(|id| tabs.iter().any(|tab| &tab.id == id));
    let active_group_filters = snapshot
        .active_group_filters
        .iter()
        .filter(|id| !is_private(Some(id.as_str())))
        .cloned()
        .collect();

    Ok(BackupData {
        tabs,
        groups,
        settings: Some(SettingsPatch::from(&snapshot.settings)),
        timestamp,
        active_tab,
        active_group_filters,
        legacy: LegacySettingsFields::from_settings(&snapshot.settings),
    })
}

/// Turns a downloaded backup into a `LoadSnapshot` patch for `local`.
///
/// Remote settings are merged over the local ones; root legacy keys win
/// over nested ones. The local private group and its tabs are carried over
/// since backups never contain them. History is left untouched.
pub fn restore_patch(backup: BackupData, local: &Snapshot, private_group_name: &str) -> SnapshotPatch {
    let merged = backup
        .settings
        .as_ref()
        .map_or_else(|| local.settings.clone(), |remote| remote.merged_over(&local.settings));
    let settings = backup.legacy.apply_over(merged);

    let mut tabs = backup.tabs;
    let mut groups = backup.groups;
    if let Some(private) = local.group_named(private_group_name) {
        if !groups.iter().any(|group| group.id == private.id) {
            for tab in local.tabs.iter().filter(|tab| tab.belongs_to(&private.id)) {
                if !tabs.iter().any(|existing| existing.id == tab.id) {
                    tabs.push(tab.clone());
                }
            }
            groups.push(private.clone());
        }
    }

    SnapshotPatch {
        tabs: Some(tabs),
        groups: Some(groups),
        active_tab_id: Some(backup.active_tab),
        active_group_filters: Some(backup.active_group_filters),
        settings: Some(settings),
        history: None,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_backup, restore_patch, BackupData};
    use crate::model::group::Group;
    use crate::model::settings::Settings;
    use crate::model::snapshot::{Snapshot, DEFAULT_PRIVATE_GROUP_NAME};
    use crate::model::tab::Tab;
    use crate::persistence::MemoryPersistence;

    fn snapshot_with_private_group() -> Snapshot {
        let mut secret = Group::new("g-secret", DEFAULT_PRIVATE_GROUP_NAME);
        let mut hidden = Tab::untitled("hidden", 0);
        hidden.group_id = Some(secret.id.clone());
        secret.tab_ids.push(hidden.id.clone());
        Snapshot {
            tabs: vec![Tab::untitled("open", 0), hidden],
            groups: vec![secret],
            active_tab_id: Some("hidden".to_string()),
            active_group_filters: vec!["g-secret".to_string()],
            ..Snapshot::default()
        }
    }

    #[test]
    fn backup_excludes_private_group() {
        let snapshot = snapshot_with_private_group();
        let backup = build_backup(
            &snapshot,
            &MemoryPersistence::new(),
            DEFAULT_PRIVATE_GROUP_NAME,
            "2024-01-01T00:00:00.000Z".to_string(),
        )
        .unwrap();
        assert_eq!(backup.tabs.len(), 1);
        assert_eq!(backup.tabs[0].id, "open");
        assert!(backup.groups.is_empty());
        assert_eq!(backup.active_tab, None);
        assert!(backup.active_group_filters.is_empty());
    }

    #[test]
    fn root_theme_wins_over_nested_settings() {
        let raw = r##"{
            "tabs": [{"id": "a", "name": "A"}],
            "settings": {"theme": "dark", "aiName": "Remote"},
            "theme": "blue",
            "timestamp": "2024-01-01T00:00:00.000Z",
            "activeTab": "a"
        }"##;
        let backup: BackupData = serde_json::from_str(raw).unwrap();
        let local = Snapshot {
            settings: Settings {
                ai_enabled: false,
                ..Settings::default()
            },
            ..Snapshot::default()
        };
        let patch = restore_patch(backup, &local, DEFAULT_PRIVATE_GROUP_NAME);
        let settings = patch.settings.unwrap();
        assert_eq!(settings.theme, "blue");
        assert_eq!(settings.ai_name, "Remote");
        assert!(!settings.ai_enabled);
        assert_eq!(patch.active_tab_id, Some(Some("a".to_string())));
    }

    #[test]
    fn restore_keeps_local_private_group() {
        let local = snapshot_with_private_group();
        let backup: BackupData = serde_json::from_str(r#"{"tabs":[{"id":"remote"}]}"#).unwrap();
        let patch = restore_patch(backup, &local, DEFAULT_PRIVATE_GROUP_NAME);
        let tab_ids: Vec<String> = patch.tabs.unwrap().into_iter().map(|tab| tab.id).collect();
        assert_eq!(tab_ids, vec!["remote".to_string(), "hidden".to_string()]);
        assert_eq!(patch.groups.unwrap()[0].id, "g-secret");
    }
}
