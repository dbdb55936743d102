//! Cloud backup collaborator.
//!
//! # Responsibility
//! - Build and restore the backup document exchanged with providers.
//! - Run save/load flows against an explicit store.
//!
//! # Invariants
//! - Providers only see the backup document, never the store.

pub mod backup;
pub mod cloud_sync;
pub mod provider;

pub use backup::{build_backup, restore_patch, BackupData};
pub use cloud_sync::{CloudSync, LoadOutcome, SyncError};
pub use provider::{CloudError, CloudProvider, MemoryCloudProvider};
