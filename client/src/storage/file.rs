//! File-backed store.
//!
//! All entries live in one JSON document with a format version. Entries use a
//! `BTreeMap` so the file is written in a deterministic order. Every write
//! goes to a temporary file first and is renamed into place.

use super::{KvStore, StorageError, StoreWrite};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Version of the on-disk format for future compatibility.
pub const STORE_FORMAT_VERSION: u32 = 1;

const FILE_NAME: &str = "marks.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreDocument {
    format_version: u32,
    entries: BTreeMap<String, String>,
}

/// A [`KvStore`] persisted to a single file inside a data directory.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store in `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(FILE_NAME);

        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let document: StoreDocument =
                serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
                    key: FILE_NAME.to_string(),
                    reason: e.to_string(),
                })?;
            if document.format_version > STORE_FORMAT_VERSION {
                return Err(StorageError::UnsupportedFormat {
                    found: document.format_version,
                    supported: STORE_FORMAT_VERSION,
                });
            }
            document.entries
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let document = StoreDocument {
            format_version: STORE_FORMAT_VERSION,
            entries: entries.clone(),
        };
        let json = serde_json::to_string(&document).map_err(|e| StorageError::Corrupt {
            key: FILE_NAME.to_string(),
            reason: e.to_string(),
        })?;

        let tmp = self.temp_path();
        blocking_io(|| -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, &self.path)
        })?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

/// Run file I/O in place, letting a multi-thread runtime move other tasks
/// off this worker while it blocks.
fn blocking_io<T>(io: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(io)
        }
        _ => io(),
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(vec![StoreWrite::Put(key.to_string(), value.to_string())])
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.apply(vec![StoreWrite::Delete(key.to_string())])
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn apply(&self, writes: Vec<StoreWrite>) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = entries.clone();
        for write in writes {
            match write {
                StoreWrite::Put(key, value) => {
                    next.insert(key, value);
                }
                StoreWrite::Delete(key) => {
                    next.remove(&key);
                }
            }
        }
        // Memory only changes once the file is safely on disk.
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.put("mirror/a", r#"{"id":"a"}"#).unwrap();
            store.put("pending_log", "[]").unwrap();
            store.delete("pending_log").unwrap();
        }

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("mirror/a").unwrap().as_deref(), Some(r#"{"id":"a"}"#));
        assert_eq!(store.get("pending_log").unwrap(), None);
        assert_eq!(store.keys_with_prefix("mirror/").unwrap(), vec!["mirror/a"]);
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        store.put("k", "v").unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn rejects_newer_format() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(FILE_NAME),
            r#"{"formatVersion":99,"entries":{}}"#,
        )
        .unwrap();

        assert!(matches!(
            FileStore::open(dir.path()),
            Err(StorageError::UnsupportedFormat { found: 99, .. })
        ));
    }

    #[test]
    fn rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(FILE_NAME), "not json").unwrap();
        assert!(matches!(
            FileStore::open(dir.path()),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn batch_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store
            .apply(vec![
                StoreWrite::Put("mirror/a".into(), "1".into()),
                StoreWrite::Put("mirror/b".into(), "2".into()),
                StoreWrite::Delete("mirror/a".into()),
            ])
            .unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"formatVersion\":1"));
        assert_eq!(store.keys_with_prefix("mirror/").unwrap(), vec!["mirror/b"]);
    }

    #[test]
    fn temp_file_is_renamed_away() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.put("k", "v").unwrap();
        assert!(store.path().exists());
        assert!(!store.temp_path().exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn writes_from_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.put("mirror/a", "1").unwrap();
        store.delete("mirror/a").unwrap();
        store.put("mirror/b", "2").unwrap();
        drop(store);

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.keys_with_prefix("mirror/").unwrap(), vec!["mirror/b"]);
    }

    #[tokio::test]
    async fn writes_from_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.put("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
