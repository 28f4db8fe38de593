//! Local durable state and the observable sync status.

use crate::mirror::Mirror;
use crate::pending_log::PendingLog;
use crate::storage::{KvStore, StorageError, LAST_SYNC_KEY};
use marks_engine::{project, Collection, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle of the sync coordinator within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Error,
}

/// Process-wide sync state, written only by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub status: SyncStatus,
    /// Last successful full sync (milliseconds since epoch)
    pub last_sync: Option<Timestamp>,
    /// Operations still waiting for confirmation
    pub pending: usize,
}

/// Mirror, pending log and last-sync timestamp, loaded together.
pub(crate) struct LocalState {
    pub(crate) mirror: Mirror,
    pub(crate) log: PendingLog,
    last_sync: Option<Timestamp>,
    store: Arc<dyn KvStore>,
}

impl LocalState {
    pub(crate) fn load(store: Arc<dyn KvStore>) -> Result<Self, StorageError> {
        let mirror = Mirror::load(store.clone())?;
        let log = PendingLog::load(store.clone())?;
        let last_sync = match store.get(LAST_SYNC_KEY)? {
            Some(raw) => Some(raw.trim().parse::<Timestamp>().map_err(|_| StorageError::Corrupt {
                key: LAST_SYNC_KEY.to_string(),
                reason: format!("not a timestamp: {raw}"),
            })?),
            None => None,
        };

        Ok(Self {
            mirror,
            log,
            last_sync,
            store,
        })
    }

    /// Mirror with the pending log replayed on top.
    pub(crate) fn projection(&self) -> Collection {
        project(self.mirror.entries(), self.log.operations())
    }

    pub(crate) fn last_sync(&self) -> Option<Timestamp> {
        self.last_sync
    }

    pub(crate) fn set_last_sync(&mut self, at: Timestamp) -> Result<(), StorageError> {
        self.store.put(LAST_SYNC_KEY, &at.to_string())?;
        self.last_sync = Some(at);
        Ok(())
    }
}
