//! Shared test helpers: an in-memory remote and coordinator wiring.

#![allow(dead_code)]

use async_trait::async_trait;
use marks_client::{
    KvStore, ListFilter, MemoryStore, NetworkStatus, RemoteError, RemoteGateway, SyncCoordinator,
};
use marks_engine::{Bookmark, BookmarkDraft, BookmarkPatch};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Remote API double holding bookmarks in a map.
///
/// Writes are counted from zero across create/update/delete so a test can
/// fail exactly the n-th one.
#[derive(Default)]
pub struct FakeGateway {
    server: Mutex<BTreeMap<String, Bookmark>>,
    calls: Mutex<Vec<String>>,
    writes: AtomicUsize,
    fail_write_at: Mutex<Option<usize>>,
    reject_writes: AtomicBool,
    lose_next_response: AtomicBool,
    delay: Mutex<Option<Duration>>,
    drop_connection: Mutex<Option<Arc<NetworkStatus>>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, bookmark: Bookmark) {
        self.server
            .lock()
            .unwrap()
            .insert(bookmark.id.clone(), bookmark);
    }

    pub fn remove_behind_the_back(&self, id: &str) {
        self.server.lock().unwrap().remove(id);
    }

    pub fn server_bookmarks(&self) -> Vec<Bookmark> {
        self.server.lock().unwrap().values().cloned().collect()
    }

    pub fn server_get(&self, id: &str) -> Option<Bookmark> {
        self.server.lock().unwrap().get(id).cloned()
    }

    /// Calls seen so far, as `"kind"` or `"kind:id"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn write_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list"))
            .collect()
    }

    pub fn fail_write_at(&self, index: usize) {
        *self.fail_write_at.lock().unwrap() = Some(index);
    }

    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Apply the next write on the server but report a transport failure.
    pub fn lose_next_response(&self) {
        self.lose_next_response.store(true, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Flip `status` offline whenever a write fails.
    pub fn drop_connection_on_failure(&self, status: Arc<NetworkStatus>) {
        *self.drop_connection.lock().unwrap() = Some(status);
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    /// Decide whether this write fails before touching the server.
    fn check_write(&self) -> Result<(), RemoteError> {
        let index = self.writes.fetch_add(1, Ordering::SeqCst);
        let scripted = *self.fail_write_at.lock().unwrap() == Some(index);
        if scripted || self.reject_writes.load(Ordering::SeqCst) {
            if let Some(status) = self.drop_connection.lock().unwrap().as_ref() {
                status.set_online(false);
            }
            return Err(RemoteError::Status(500));
        }
        Ok(())
    }

    fn respond<T>(&self, value: T) -> Result<T, RemoteError> {
        if self.lose_next_response.swap(false, Ordering::SeqCst) {
            return Err(RemoteError::Transport("connection reset".into()));
        }
        Ok(value)
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    async fn list(&self, _filter: &ListFilter) -> Result<Vec<Bookmark>, RemoteError> {
        self.record("list".into());
        self.pause().await;
        Ok(self.server_bookmarks())
    }

    async fn create(&self, bookmark: &Bookmark) -> Result<Bookmark, RemoteError> {
        self.record(format!("create:{}", bookmark.id));
        self.pause().await;
        self.check_write()?;

        let mut server = self.server.lock().unwrap();
        if server.contains_key(&bookmark.id) {
            return Err(RemoteError::Status(409));
        }
        server.insert(bookmark.id.clone(), bookmark.clone());
        drop(server);
        self.respond(bookmark.clone())
    }

    async fn update(&self, id: &str, patch: &BookmarkPatch) -> Result<Bookmark, RemoteError> {
        self.record(format!("update:{id}"));
        self.pause().await;
        self.check_write()?;

        let mut server = self.server.lock().unwrap();
        let Some(existing) = server.get_mut(id) else {
            return Err(RemoteError::Status(404));
        };
        let at = existing.updated_at + 1;
        existing.apply_patch(patch, at);
        let updated = existing.clone();
        drop(server);
        self.respond(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.record(format!("delete:{id}"));
        self.pause().await;
        self.check_write()?;

        if self.server.lock().unwrap().remove(id).is_none() {
            return Err(RemoteError::Status(404));
        }
        self.respond(())
    }
}

/// Coordinator, remote and connectivity flag wired together.
pub struct Harness {
    pub coordinator: Arc<SyncCoordinator>,
    pub gateway: Arc<FakeGateway>,
    pub network: Arc<NetworkStatus>,
    pub store: Arc<dyn KvStore>,
}

impl Harness {
    pub fn online() -> Self {
        Self::with(Arc::new(MemoryStore::new()), FakeGateway::new(), true)
    }

    pub fn offline() -> Self {
        Self::with(Arc::new(MemoryStore::new()), FakeGateway::new(), false)
    }

    pub fn with(store: Arc<dyn KvStore>, gateway: Arc<FakeGateway>, online: bool) -> Self {
        let network = Arc::new(NetworkStatus::new(online));
        let coordinator = SyncCoordinator::open(store.clone(), gateway.clone(), network.clone())
            .expect("open coordinator");
        Self {
            coordinator: Arc::new(coordinator),
            gateway,
            network,
            store,
        }
    }

    /// Reopen a coordinator over the same store and remote.
    pub fn reopen(&self, online: bool) -> Self {
        Self::with(self.store.clone(), self.gateway.clone(), online)
    }
}

pub fn draft(title: &str, url: &str) -> BookmarkDraft {
    BookmarkDraft::new(title, url)
}

pub fn remote_bookmark(id: &str, title: &str, url: &str, at: u64) -> Bookmark {
    Bookmark::from_draft(id, BookmarkDraft::new(title, url), at)
}
