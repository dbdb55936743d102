//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose one workspace handle that owns a store; no process globals
//!   hold workspace state.
//! - Translate core results into simple envelopes for the UI.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Commands cross the boundary as JSON documents
//!   (`{"type": ..., "payload": ...}`); snapshots go back as JSON.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use log::warn;
use tabnote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AiError, CloudSync, Command, CoreConfig, LoadOutcome, MemoryCloudProvider, QueryContext,
    SqlitePersistence, Store,
};

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Exposes the core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Whether the snapshot changed.
    pub changed: bool,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl WorkspaceActionResponse {
    fn success(changed: bool, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            changed,
            message: message.into(),
        }
    }

    fn failure(changed: bool, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            changed,
            message: message.into(),
        }
    }
}

/// Text-valued envelope (snapshot JSON, AI prompt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceTextResponse {
    pub ok: bool,
    /// Payload; empty on failure.
    pub text: String,
    pub message: String,
}

impl WorkspaceTextResponse {
    fn success(text: String) -> Self {
        Self {
            ok: true,
            text,
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: String::new(),
            message: message.into(),
        }
    }
}

/// Tab strip row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSummary {
    pub id: String,
    pub name: String,
    pub color: String,
    pub group_id: Option<String>,
    pub is_active: bool,
}

/// Group bar chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub tab_count: u32,
    pub is_filtered: bool,
}

/// Opaque workspace owned by the Dart side.
#[flutter_rust_bridge::frb(opaque)]
pub struct WorkspaceHandle {
    store: Mutex<Store<SqlitePersistence>>,
    cloud: Mutex<CloudSync<MemoryCloudProvider>>,
    private_group_name: String,
}

/// Opens (or creates) a workspace database.
///
/// `db_path` overrides `TABNOTE_DB_PATH`; blank means "use configuration".
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Errors surface as a Dart exception carrying the message.
#[flutter_rust_bridge::frb(sync)]
pub fn open_workspace(db_path: Option<String>) -> Result<WorkspaceHandle, String> {
    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(path) = db_path
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        config.db_path = PathBuf::from(path);
    }
    config
        .ensure_db_dir()
        .map_err(|err| format!("open_workspace failed: {err}"))?;

    let bridge = SqlitePersistence::open(&config.db_path)
        .map_err(|err| format!("open_workspace failed: {err}"))?;
    let store = Store::open(bridge).map_err(|err| format!("open_workspace failed: {err}"))?;

    Ok(WorkspaceHandle {
        store: Mutex::new(store),
        cloud: Mutex::new(CloudSync::new(
            MemoryCloudProvider::new(),
            config.private_group_name.clone(),
        )),
        private_group_name: config.private_group_name,
    })
}

impl WorkspaceHandle {
    /// Applies one JSON command document.
    ///
    /// # FFI contract
    /// - Malformed documents are rejected without touching state.
    /// - A storage failure reports `ok=false` with `changed=true`: the
    ///   in-memory snapshot already moved on.
    #[flutter_rust_bridge::frb(sync)]
    pub fn dispatch_json(&self, command_json: String) -> WorkspaceActionResponse {
        let command = match Command::from_json(&command_json) {
            Ok(command) => command,
            Err(err) => {
                return WorkspaceActionResponse::failure(false, format!("invalid command: {err}"))
            }
        };
        let mut store = match self.lock_store() {
            Ok(store) => store,
            Err(message) => return WorkspaceActionResponse::failure(false, message),
        };
        match store.dispatch(command) {
            Ok(changed) => WorkspaceActionResponse::success(changed, ""),
            Err(err) => WorkspaceActionResponse::failure(true, format!("persist failed: {err}")),
        }
    }

    /// Current snapshot as camelCase JSON.
    #[flutter_rust_bridge::frb(sync)]
    pub fn snapshot_json(&self) -> WorkspaceTextResponse {
        let store = match self.lock_store() {
            Ok(store) => store,
            Err(message) => return WorkspaceTextResponse::failure(message),
        };
        match serde_json::to_string(store.snapshot()) {
            Ok(json) => WorkspaceTextResponse::success(json),
            Err(err) => WorkspaceTextResponse::failure(format!("snapshot encode failed: {err}")),
        }
    }

    /// Tabs under the active group filters, in strip order.
    #[flutter_rust_bridge::frb(sync)]
    pub fn visible_tabs(&self) -> Vec<TabSummary> {
        let Ok(store) = self.lock_store() else {
            return Vec::new();
        };
        let snapshot = store.snapshot();
        snapshot
            .visible_tabs()
            .into_iter()
            .map(|tab| TabSummary {
                id: tab.id.clone(),
                name: tab.name.clone(),
                color: tab.color.clone(),
                group_id: tab.group_id.clone(),
                is_active: snapshot.active_tab_id.as_deref() == Some(tab.id.as_str()),
            })
            .collect()
    }

    /// Groups for the group bar; the private group only when revealed.
    #[flutter_rust_bridge::frb(sync)]
    pub fn visible_groups(&self) -> Vec<GroupSummary> {
        let Ok(store) = self.lock_store() else {
            return Vec::new();
        };
        let snapshot = store.snapshot();
        snapshot
            .visible_groups(&self.private_group_name)
            .into_iter()
            .map(|group| GroupSummary {
                id: group.id.clone(),
                name: group.name.clone(),
                color: group.color.clone(),
                icon: group.icon.clone(),
                tab_count: u32::try_from(group.tab_ids.len()).unwrap_or(u32::MAX),
                is_filtered: snapshot.active_group_filters.contains(&group.id),
            })
            .collect()
    }

    /// Uploads a backup through the workspace's cloud provider.
    #[flutter_rust_bridge::frb(sync)]
    pub fn cloud_save(&self) -> WorkspaceActionResponse {
        let (mut cloud, mut store) = match (self.lock_cloud(), self.lock_store()) {
            (Ok(cloud), Ok(store)) => (cloud, store),
            (Err(message), _) | (_, Err(message)) => {
                return WorkspaceActionResponse::failure(false, message)
            }
        };
        match cloud.save(&mut store) {
            Ok(backup) => WorkspaceActionResponse::success(
                true,
                format!("Saved {} tab(s) to cloud.", backup.tabs.len()),
            ),
            Err(err) => WorkspaceActionResponse::failure(false, format!("cloud save failed: {err}")),
        }
    }

    /// Replaces local data with the provider's backup.
    #[flutter_rust_bridge::frb(sync)]
    pub fn cloud_load(&self) -> WorkspaceActionResponse {
        let (mut cloud, mut store) = match (self.lock_cloud(), self.lock_store()) {
            (Ok(cloud), Ok(store)) => (cloud, store),
            (Err(message), _) | (_, Err(message)) => {
                return WorkspaceActionResponse::failure(false, message)
            }
        };
        match cloud.load(&mut store) {
            Ok(LoadOutcome::NoBackup) => WorkspaceActionResponse::success(false, "No backup found."),
            Ok(LoadOutcome::Restored { tabs }) => {
                WorkspaceActionResponse::success(true, format!("Loaded {tabs} tab(s) from cloud."))
            }
            Err(err) => WorkspaceActionResponse::failure(false, format!("cloud load failed: {err}")),
        }
    }

    /// Builds the AI prompt for `query` against the current snapshot.
    ///
    /// The model call itself belongs to the host.
    #[flutter_rust_bridge::frb(sync)]
    pub fn ai_context(&self, query: String) -> WorkspaceTextResponse {
        let store = match self.lock_store() {
            Ok(store) => store,
            Err(message) => return WorkspaceTextResponse::failure(message),
        };
        match QueryContext::from_snapshot(store.snapshot(), &query) {
            Ok(context) => WorkspaceTextResponse::success(tabnote_core::build_prompt(&context)),
            Err(AiError::Disabled) => WorkspaceTextResponse::failure("AI assistant is disabled."),
            Err(err) => WorkspaceTextResponse::failure(err.to_string()),
        }
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, Store<SqlitePersistence>>, String> {
        self.store.lock().map_err(|_| {
            warn!("event=workspace_lock module=ffi status=error target=store");
            "workspace store is unavailable".to_string()
        })
    }

    fn lock_cloud(&self) -> Result<MutexGuard<'_, CloudSync<MemoryCloudProvider>>, String> {
        self.cloud.lock().map_err(|_| {
            warn!("event=workspace_lock module=ffi status=error target=cloud");
            "cloud sync is unavailable".to_string()
        })
    }
}
