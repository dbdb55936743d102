//! Core state model for TabNote.
//! This crate is the single source of truth for tab/group invariants.

pub mod ai;
pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod store;
pub mod sync;

pub use ai::{answer, build_prompt, AiClient, AiError, QueryContext};
pub use config::{ConfigError, CoreConfig};
pub use engine::{
    draft_new_tab, rebalance_after_delete, transition, Command, GroupFilterToggle, Rebalanced,
    SequenceEnv, SystemEnv, TransitionEnv, RESET_ALL_FILTERS,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::action_log::{ActionLog, ActionLogEntry, HISTORY_LIMIT};
pub use model::group::{Group, GroupId, GroupPatch};
pub use model::settings::{GridPatternStyle, Settings, SettingsPatch};
pub use model::snapshot::{InvariantViolation, Snapshot, SnapshotPatch};
pub use model::tab::{Tab, TabId, TabPatch};
pub use persistence::{
    MemoryPersistence, PersistenceBridge, PersistenceError, PersistenceResult, SqlitePersistence,
};
pub use store::Store;
pub use sync::{
    BackupData, CloudError, CloudProvider, CloudSync, LoadOutcome, MemoryCloudProvider, SyncError,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
