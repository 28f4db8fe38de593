//! Sync coordinator.
//!
//! Owns the mirror and the pending log, applies mutations optimistically and
//! drains the log against the remote gateway.
//!
//! # Locking
//!
//! - `state` serializes every read-modify-write of the mirror and log. It is
//!   never held across a network call.
//! - `drain_lock` serializes network delivery. Whoever holds it sends the
//!   head of the log, one operation at a time, so at most one write is in
//!   flight and the server sees operations in log order.
//!
//! # Conflict policy
//!
//! Last writer wins. While operations are pending the optimistic projection
//! is shown; once the log drains the server's list replaces the mirror.

use crate::connectivity::Connectivity;
use crate::error::{Error, Result};
use crate::gateway::{ListFilter, RemoteError, RemoteGateway};
use crate::notifier::{ChangeNotifier, Subscription, SubscriptionId};
use crate::state::{LocalState, SyncState, SyncStatus};
use crate::storage::KvStore;
use marks_engine::{
    find_duplicates, matching_url, Bookmark, BookmarkDraft, BookmarkPatch, Collection, CreateOp,
    DeleteOp, DuplicateSet, PendingOperation, Timestamp, UpdateOp,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

/// Upper bound on a single remote call unless overridden.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Whether a mutation reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The remote confirmed the operation and it left the log.
    Confirmed,
    /// Offline: the operation stays queued for a later sync.
    Queued,
}

/// Successful result of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    /// The bookmark as currently projected (`None` after a delete)
    pub bookmark: Option<Bookmark>,
    pub delivery: Delivery,
}

impl MutationOutcome {
    pub fn is_queued(&self) -> bool {
        self.delivery == Delivery::Queued
    }
}

/// The offline-first sync engine for one session.
pub struct SyncCoordinator {
    state: Mutex<LocalState>,
    drain_lock: Mutex<()>,
    sync_running: AtomicBool,
    gateway: Arc<dyn RemoteGateway>,
    connectivity: Arc<dyn Connectivity>,
    notifier: ChangeNotifier,
    sync_state: watch::Sender<SyncState>,
    request_timeout: Duration,
}

impl SyncCoordinator {
    /// Load persisted state and build a coordinator.
    pub fn open(
        store: Arc<dyn KvStore>,
        gateway: Arc<dyn RemoteGateway>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Result<Self> {
        let state = LocalState::load(store)?;
        let (sync_state, _) = watch::channel(SyncState {
            status: SyncStatus::Idle,
            last_sync: state.last_sync(),
            pending: state.log.len(),
        });

        info!(
            mirrored = state.mirror.len(),
            pending = state.log.len(),
            "opened local state"
        );

        Ok(Self {
            state: Mutex::new(state),
            drain_lock: Mutex::new(()),
            sync_running: AtomicBool::new(false),
            gateway,
            connectivity,
            notifier: ChangeNotifier::new(),
            sync_state,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Override the bound on each remote call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Create a bookmark.
    ///
    /// The bookmark is visible to observers before any network call. Offline,
    /// the create stays queued and this returns `Ok` with
    /// [`Delivery::Queued`]. Online, a remote failure is returned as
    /// [`Error::Remote`] and the create still stays queued.
    pub async fn create(&self, draft: BookmarkDraft) -> Result<MutationOutcome> {
        draft.validate()?;

        let op = {
            let mut state = self.state.lock().await;
            let bookmark = Bookmark::from_draft(new_id(), draft, now_millis());
            let op = PendingOperation::Create(CreateOp::new(new_id(), bookmark));
            state.log.append(op.clone())?;
            self.publish(&state);
            op
        };

        debug!(op_id = %op.op_id(), bookmark_id = %op.bookmark_id(), "queued create");
        self.deliver_mutation(op).await
    }

    /// Merge fields into an existing bookmark.
    pub async fn update(&self, id: &str, patch: BookmarkPatch) -> Result<MutationOutcome> {
        let patch = patch.normalized();
        patch.validate()?;
        self.update_with(id, move |_, _| patch).await
    }

    /// Record a visit: bump `visit_count` and set `last_visited_at` to now.
    pub async fn track_visit(&self, id: &str) -> Result<MutationOutcome> {
        self.update_with(id, BookmarkPatch::visit).await
    }

    /// Remove a bookmark.
    pub async fn delete(&self, id: &str) -> Result<MutationOutcome> {
        let op = {
            let mut state = self.state.lock().await;
            if !state.projection().contains(id) {
                return Err(marks_engine::Error::NotFound(id.to_string()).into());
            }
            let op = PendingOperation::Delete(DeleteOp::new(new_id(), id, now_millis()));
            state.log.append(op.clone())?;
            self.publish(&state);
            op
        };

        debug!(op_id = %op.op_id(), bookmark_id = %id, "queued delete");
        self.deliver_mutation(op).await
    }

    /// Build the patch from the current projected bookmark while holding the
    /// state lock, so read-increment-write sequences cannot interleave.
    async fn update_with<F>(&self, id: &str, make_patch: F) -> Result<MutationOutcome>
    where
        F: FnOnce(&Bookmark, Timestamp) -> BookmarkPatch,
    {
        let op = {
            let mut state = self.state.lock().await;
            let projection = state.projection();
            let current = projection
                .get(id)
                .ok_or_else(|| marks_engine::Error::NotFound(id.to_string()))?;
            let timestamp = now_millis().max(current.updated_at);
            let patch = make_patch(current, timestamp);
            let op = PendingOperation::Update(UpdateOp::new(new_id(), id, patch, timestamp));
            state.log.append(op.clone())?;
            self.publish(&state);
            op
        };

        debug!(op_id = %op.op_id(), bookmark_id = %id, "queued update");
        self.deliver_mutation(op).await
    }

    /// Remote leg of a mutation: push the log through up to this operation.
    async fn deliver_mutation(&self, op: PendingOperation) -> Result<MutationOutcome> {
        let id = op.bookmark_id().clone();

        if !self.connectivity.is_online() {
            debug!(op_id = %op.op_id(), "offline, operation stays queued");
            return Ok(self.outcome(&id, Delivery::Queued).await);
        }

        match self.push_through(op.op_id()).await {
            Ok(()) => Ok(self.outcome(&id, Delivery::Confirmed).await),
            Err(Error::Remote(e)) if !self.connectivity.is_online() => {
                debug!(op_id = %op.op_id(), error = %e, "connection lost, operation stays queued");
                Ok(self.outcome(&id, Delivery::Queued).await)
            }
            Err(e) => {
                warn!(op_id = %op.op_id(), error = %e, "remote rejected operation, it stays queued");
                Err(e)
            }
        }
    }

    async fn outcome(&self, id: &str, delivery: Delivery) -> MutationOutcome {
        let state = self.state.lock().await;
        MutationOutcome {
            bookmark: state.projection().get(id).cloned(),
            delivery,
        }
    }

    /// Deliver log entries in order until `op_id` is confirmed or one fails.
    async fn push_through(&self, op_id: &str) -> Result<()> {
        let _drain = self.drain_lock.lock().await;
        loop {
            let head = {
                let state = self.state.lock().await;
                if !state.log.contains(op_id) {
                    // Already drained by a sync pass.
                    return Ok(());
                }
                state.log.front().cloned()
            };
            let Some(head) = head else {
                return Ok(());
            };
            self.deliver(&head).await?;
            if head.op_id() == op_id {
                return Ok(());
            }
        }
    }

    // ------------------------------------------------------------------
    // Reconciliation
    // ------------------------------------------------------------------

    /// Drain the pending log, then refresh the mirror from the server.
    ///
    /// Returns `false` without doing anything when offline or when another
    /// sync is already running. Operations are sent one at a time in log
    /// order; the first failure stops the drain, keeps the rest queued and
    /// returns `false`. Operations confirmed before the failure stay
    /// confirmed.
    pub async fn sync(&self) -> bool {
        if !self.connectivity.is_online() {
            debug!("offline, skipping sync");
            return false;
        }
        if self.sync_running.swap(true, Ordering::AcqRel) {
            debug!("sync already running, coalescing");
            return false;
        }
        let _running = RunningFlag(&self.sync_running);
        let _drain = self.drain_lock.lock().await;

        self.set_status(SyncStatus::Syncing);
        info!(pending = self.sync_state().pending, "sync started");

        let result: Result<()> = async {
            self.drain().await?;
            self.refresh().await
        }
        .await;

        match result {
            Ok(()) => {
                self.set_status(SyncStatus::Idle);
                info!("sync finished");
                true
            }
            Err(e) => {
                match &e {
                    Error::Remote(_) => warn!(error = %e, "sync stopped, remaining operations stay queued"),
                    _ => error!(error = %e, "sync failed"),
                }
                self.set_status(SyncStatus::Error);
                let state = self.state.lock().await;
                self.publish(&state);
                false
            }
        }
    }

    async fn drain(&self) -> Result<()> {
        loop {
            let head = self.state.lock().await.log.front().cloned();
            let Some(op) = head else {
                return Ok(());
            };
            debug!(
                op_id = %op.op_id(),
                kind = op.kind(),
                bookmark_id = %op.bookmark_id(),
                "draining operation"
            );
            self.deliver(&op).await?;
        }
    }

    /// Overwrite the mirror with the server's full collection.
    async fn refresh(&self) -> Result<()> {
        let remote = self.fetch_all().await?;
        let count = remote.len();

        let mut state = self.state.lock().await;
        state.mirror.replace_all(remote)?;
        state.set_last_sync(now_millis())?;
        self.publish(&state);

        info!(bookmarks = count, pending = state.log.len(), "mirror refreshed from remote");
        Ok(())
    }

    /// Startup: fetch the remote collection and expose it with pending
    /// operations replayed on top. Falls back to the persisted mirror when
    /// the fetch fails.
    pub async fn load(&self) -> Result<Arc<Collection>> {
        let _drain = self.drain_lock.lock().await;

        let remote = if self.connectivity.is_online() {
            match self.fetch_all().await {
                Ok(remote) => Some(remote),
                Err(e) => {
                    warn!(error = %e, "remote list failed, using persisted mirror");
                    None
                }
            }
        } else {
            debug!("offline, using persisted mirror");
            None
        };

        let mut state = self.state.lock().await;
        if let Some(remote) = remote {
            state.mirror.replace_all(remote)?;
        }
        let collection = self.publish(&state);

        info!(
            bookmarks = collection.len(),
            pending = state.log.len(),
            "collection loaded"
        );
        Ok(collection)
    }

    /// Send one operation and, on success, fold the result into local state.
    async fn deliver(&self, op: &PendingOperation) -> Result<()> {
        let confirmed = self.send(op).await?;

        let mut state = self.state.lock().await;
        match op {
            PendingOperation::Create(create) => match confirmed {
                Some(bookmark) => state.mirror.put(bookmark)?,
                // Already on the server; keep the local copy until the next refresh.
                None if state.mirror.get(&create.bookmark.id).is_none() => {
                    state.mirror.put(create.bookmark.clone())?
                }
                None => {}
            },
            PendingOperation::Update(update) => match confirmed {
                Some(bookmark) => state.mirror.put(bookmark)?,
                None => state.mirror.remove(&update.id)?,
            },
            PendingOperation::Delete(delete) => state.mirror.remove(&delete.id)?,
        }
        state.log.remove(op.op_id())?;
        self.publish(&state);

        debug!(op_id = %op.op_id(), kind = op.kind(), "operation confirmed");
        Ok(())
    }

    /// Execute the remote call for an operation.
    ///
    /// Repeats are recognised as success: 409 on create, 404 on update or
    /// delete. `Ok(None)` means there is no canonical record to store.
    async fn send(&self, op: &PendingOperation) -> std::result::Result<Option<Bookmark>, RemoteError> {
        let call = async {
            match op {
                PendingOperation::Create(create) => {
                    match self.gateway.create(&create.bookmark).await {
                        Ok(bookmark) => Ok(Some(bookmark)),
                        Err(e) if e.is_conflict() => {
                            debug!(bookmark_id = %create.bookmark.id, "create already applied remotely");
                            Ok(None)
                        }
                        Err(e) => Err(e),
                    }
                }
                PendingOperation::Update(update) => {
                    match self.gateway.update(&update.id, &update.patch).await {
                        Ok(bookmark) => Ok(Some(bookmark)),
                        Err(e) if e.is_not_found() => {
                            debug!(bookmark_id = %update.id, "update target gone remotely");
                            Ok(None)
                        }
                        Err(e) => Err(e),
                    }
                }
                PendingOperation::Delete(delete) => match self.gateway.delete(&delete.id).await {
                    Ok(()) => Ok(None),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(e),
                },
            }
        };

        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| RemoteError::Timeout)?
    }

    async fn fetch_all(&self) -> std::result::Result<Vec<Bookmark>, RemoteError> {
        tokio::time::timeout(self.request_timeout, self.gateway.list(&ListFilter::all()))
            .await
            .map_err(|_| RemoteError::Timeout)?
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Compute the projection and push it, with the pending count, to observers.
    fn publish(&self, state: &LocalState) -> Arc<Collection> {
        let collection = Arc::new(state.projection());
        let pending = state.log.len();
        let last_sync = state.last_sync();
        self.sync_state.send_modify(|s| {
            s.pending = pending;
            s.last_sync = last_sync;
        });
        self.notifier.publish(collection.clone());
        collection
    }

    fn set_status(&self, status: SyncStatus) {
        self.sync_state.send_modify(|s| s.status = status);
    }

    /// Current projected collection.
    pub async fn collection(&self) -> Arc<Collection> {
        Arc::new(self.state.lock().await.projection())
    }

    /// A single projected bookmark.
    pub async fn get(&self, id: &str) -> Option<Bookmark> {
        self.state.lock().await.projection().get(id).cloned()
    }

    /// Copy of the confirmed mirror, without pending operations.
    pub async fn mirror(&self) -> Vec<Bookmark> {
        self.state.lock().await.mirror.entries().values().cloned().collect()
    }

    /// Copy of the pending log in drain order.
    pub async fn pending_operations(&self) -> Vec<PendingOperation> {
        self.state.lock().await.log.operations().to_vec()
    }

    /// Duplicate sets in the current projection.
    pub async fn duplicates(&self) -> Vec<DuplicateSet> {
        find_duplicates(self.collection().await.iter())
    }

    /// Projected bookmarks that would duplicate `url`.
    pub async fn duplicates_of(&self, url: &str) -> Vec<Bookmark> {
        let collection = self.collection().await;
        matching_url(collection.iter(), url)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Snapshot of the sync state.
    pub fn sync_state(&self) -> SyncState {
        *self.sync_state.borrow()
    }

    /// Watch sync state changes.
    pub fn watch_sync_state(&self) -> watch::Receiver<SyncState> {
        self.sync_state.subscribe()
    }

    /// Register an observer of projected collections.
    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.notifier.unsubscribe(id);
    }

    /// The connectivity capability this coordinator consults.
    pub fn connectivity(&self) -> Arc<dyn Connectivity> {
        self.connectivity.clone()
    }
}

/// Clears the running flag when a sync pass ends, however it ends.
struct RunningFlag<'a>(&'a AtomicBool);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Wall clock in milliseconds since the epoch.
pub(crate) fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}
