//! Durable key-value storage for local state.
//!
//! The sync client persists three logical tables through a [`KvStore`]:
//!
//! - `mirror/<id>` - one bookmark per key, JSON encoded
//! - `pending_log` - the ordered list of pending operations
//! - `last_sync` - timestamp of the last successful full sync

mod file;
mod memory;

pub use file::{FileStore, STORE_FORMAT_VERSION};
pub use memory::MemoryStore;

/// Key prefix for mirrored bookmarks.
pub const MIRROR_PREFIX: &str = "mirror/";
/// Key holding the pending operation log.
pub const PENDING_LOG_KEY: &str = "pending_log";
/// Key holding the last successful sync timestamp.
pub const LAST_SYNC_KEY: &str = "last_sync";

/// A single write in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Put(String, String),
    Delete(String),
}

/// A durable string key-value store.
pub trait KvStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace a value.
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// All keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Apply several writes. Stores that can should make this atomic.
    fn apply(&self, writes: Vec<StoreWrite>) -> Result<(), StorageError> {
        for write in writes {
            match write {
                StoreWrite::Put(key, value) => self.put(&key, &value)?,
                StoreWrite::Delete(key) => self.delete(&key)?,
            }
        }
        Ok(())
    }
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt data under '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("unsupported store format version: {found} (max supported: {supported})")]
    UnsupportedFormat { found: u32, supported: u32 },
}
