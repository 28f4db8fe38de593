//! Persistent mirror: the last known-durable copy of the remote collection.

use crate::storage::{KvStore, StorageError, StoreWrite, MIRROR_PREFIX};
use marks_engine::{Bookmark, BookmarkId};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Keyed bookmarks backed by a [`KvStore`], cached in memory.
pub struct Mirror {
    store: Arc<dyn KvStore>,
    entries: BTreeMap<BookmarkId, Bookmark>,
}

impl Mirror {
    /// Load every `mirror/<id>` entry from the store.
    pub fn load(store: Arc<dyn KvStore>) -> Result<Self, StorageError> {
        let mut entries = BTreeMap::new();
        for key in store.keys_with_prefix(MIRROR_PREFIX)? {
            let Some(raw) = store.get(&key)? else {
                continue;
            };
            let bookmark: Bookmark =
                serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;
            entries.insert(bookmark.id.clone(), bookmark);
        }
        Ok(Self { store, entries })
    }

    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.entries.get(id)
    }

    /// The keyed entries, as consumed by projection.
    pub fn entries(&self) -> &BTreeMap<BookmarkId, Bookmark> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or replace a bookmark.
    pub fn put(&mut self, bookmark: Bookmark) -> Result<(), StorageError> {
        self.store.put(&key_for(&bookmark.id), &encode(&bookmark)?)?;
        self.entries.insert(bookmark.id.clone(), bookmark);
        Ok(())
    }

    /// Remove a bookmark if present.
    pub fn remove(&mut self, id: &str) -> Result<(), StorageError> {
        if self.entries.contains_key(id) {
            self.store.delete(&key_for(id))?;
            self.entries.remove(id);
        }
        Ok(())
    }

    /// Overwrite the whole mirror with an authoritative collection.
    pub fn replace_all(&mut self, bookmarks: Vec<Bookmark>) -> Result<(), StorageError> {
        let next: BTreeMap<BookmarkId, Bookmark> = bookmarks
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect();

        let mut writes: Vec<StoreWrite> = self
            .entries
            .keys()
            .filter(|id| !next.contains_key(*id))
            .map(|id| StoreWrite::Delete(key_for(id)))
            .collect();
        for bookmark in next.values() {
            writes.push(StoreWrite::Put(key_for(&bookmark.id), encode(bookmark)?));
        }

        self.store.apply(writes)?;
        self.entries = next;
        Ok(())
    }
}

fn key_for(id: &str) -> String {
    format!("{MIRROR_PREFIX}{id}")
}

fn encode(bookmark: &Bookmark) -> Result<String, StorageError> {
    serde_json::to_string(bookmark).map_err(|e| StorageError::Corrupt {
        key: key_for(&bookmark.id),
        reason: e.to_string(),
    })
}
