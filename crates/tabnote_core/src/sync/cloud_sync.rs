//! Save/load flows between a store and a cloud provider.
//!
//! # Invariants
//! - A failed upload, download or parse leaves the snapshot untouched.
//! - Successful flows append exactly one history entry.

use std::error::Error;
use std::fmt::{Display, Formatter};

use chrono::{SecondsFormat, Utc};
use log::{info, warn};

use super::backup::{build_backup, restore_patch, BackupData};
use super::provider::{CloudError, CloudProvider};
use crate::engine::{Command, TransitionEnv};
use crate::model::action_log::kinds;
use crate::persistence::{PersistenceBridge, PersistenceError};
use crate::store::Store;

/// Errors from cloud save/load.
#[derive(Debug)]
pub enum SyncError {
    Provider(CloudError),
    /// Remote document is not a valid backup.
    InvalidDocument(serde_json::Error),
    Persistence(PersistenceError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider(err) => write!(f, "{err}"),
            Self::InvalidDocument(err) => write!(f, "invalid backup document: {err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Provider(err) => Some(err),
            Self::InvalidDocument(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<CloudError> for SyncError {
    fn from(value: CloudError) -> Self {
        Self::Provider(value)
    }
}

impl From<PersistenceError> for SyncError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

/// Result of [`CloudSync::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The provider holds no backup; nothing changed.
    NoBackup,
    /// The backup replaced local data.
    Restored { tabs: usize },
}

/// Cloud backup flows over one provider.
pub struct CloudSync<C: CloudProvider> {
    provider: C,
    private_group_name: String,
}

impl<C: CloudProvider> CloudSync<C> {
    pub fn new(provider: C, private_group_name: impl Into<String>) -> Self {
        Self {
            provider,
            private_group_name: private_group_name.into(),
        }
    }

    pub fn provider(&self) -> &C {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut C {
        &mut self.provider
    }

    /// Uploads a backup of the store's current snapshot.
    pub fn save<P: PersistenceBridge, E: TransitionEnv>(
        &mut self,
        store: &mut Store<P, E>,
    ) -> Result<BackupData, SyncError> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let backup = build_backup(
            store.snapshot(),
            store.persistence(),
            &self.private_group_name,
            timestamp,
        )?;
        let document = serde_json::to_string_pretty(&backup).map_err(PersistenceError::from)?;

        if let Err(err) = self.provider.upload(&document) {
            warn!(
                "event=cloud_save module=sync status=error provider={} error={err}",
                self.provider.provider_id()
            );
            return Err(err.into());
        }
        info!(
            "event=cloud_save module=sync status=ok provider={} tabs={} groups={}",
            self.provider.provider_id(),
            backup.tabs.len(),
            backup.groups.len()
        );

        store.dispatch(Command::log(kinds::SAVE_CLOUD, "Saved to cloud"))?;
        Ok(backup)
    }

    /// Replaces local data with the provider's backup, if any.
    pub fn load<P: PersistenceBridge, E: TransitionEnv>(
        &mut self,
        store: &mut Store<P, E>,
    ) -> Result<LoadOutcome, SyncError> {
        let document = match self.provider.download() {
            Ok(Some(document)) => document,
            Ok(None) => {
                info!(
                    "event=cloud_load module=sync status=empty provider={}",
                    self.provider.provider_id()
                );
                return Ok(LoadOutcome::NoBackup);
            }
            Err(err) => {
                warn!(
                    "event=cloud_load module=sync status=error provider={} error={err}",
                    self.provider.provider_id()
                );
                return Err(err.into());
            }
        };

        let backup: BackupData = serde_json::from_str(&document).map_err(|err| {
            warn!(
                "event=cloud_load module=sync status=error provider={} error_code=invalid_document",
                self.provider.provider_id()
            );
            SyncError::InvalidDocument(err)
        })?;

        let patch = restore_patch(backup, store.snapshot(), &self.private_group_name);
        store.dispatch(Command::LoadSnapshot(patch))?;
        store.dispatch(Command::log(kinds::LOAD_CLOUD, "Loaded from cloud"))?;

        let tabs = store.snapshot().tabs.len();
        info!(
            "event=cloud_load module=sync status=ok provider={} tabs={tabs}",
            self.provider.provider_id()
        );
        Ok(LoadOutcome::Restored { tabs })
    }
}
