//! Pending operation log: mutations not yet confirmed by the remote service.
//!
//! The log is append-only until an operation is confirmed, then that
//! operation is removed. Entries are never reordered or merged.

use crate::storage::{KvStore, StorageError, PENDING_LOG_KEY};
use marks_engine::{decode_log, encode_log, PendingOperation};
use std::sync::Arc;

/// Ordered FIFO of [`PendingOperation`]s persisted under one key.
pub struct PendingLog {
    store: Arc<dyn KvStore>,
    ops: Vec<PendingOperation>,
}

impl PendingLog {
    /// Load the log from the store, or start empty.
    pub fn load(store: Arc<dyn KvStore>) -> Result<Self, StorageError> {
        let ops = match store.get(PENDING_LOG_KEY)? {
            Some(raw) => decode_log(&raw).map_err(|e| StorageError::Corrupt {
                key: PENDING_LOG_KEY.to_string(),
                reason: e.to_string(),
            })?,
            None => Vec::new(),
        };
        Ok(Self { store, ops })
    }

    /// Append an operation at the tail.
    pub fn append(&mut self, op: PendingOperation) -> Result<(), StorageError> {
        self.ops.push(op);
        if let Err(e) = self.persist() {
            self.ops.pop();
            return Err(e);
        }
        Ok(())
    }

    /// The oldest operation, next to be drained.
    pub fn front(&self) -> Option<&PendingOperation> {
        self.ops.first()
    }

    /// Remove a confirmed operation. Returns whether it was present.
    pub fn remove(&mut self, op_id: &str) -> Result<bool, StorageError> {
        let Some(index) = self.ops.iter().position(|op| op.op_id() == op_id) else {
            return Ok(false);
        };
        let removed = self.ops.remove(index);
        if let Err(e) = self.persist() {
            self.ops.insert(index, removed);
            return Err(e);
        }
        Ok(true)
    }

    pub fn contains(&self, op_id: &str) -> bool {
        self.ops.iter().any(|op| op.op_id() == op_id)
    }

    pub fn operations(&self) -> &[PendingOperation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = encode_log(&self.ops).map_err(|e| StorageError::Corrupt {
            key: PENDING_LOG_KEY.to_string(),
            reason: e.to_string(),
        })?;
        self.store.put(PENDING_LOG_KEY, &json)
    }
}
