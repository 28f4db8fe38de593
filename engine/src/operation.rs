//! Pending operation types.
//!
//! User mutations are recorded as operations, not applied to the mirror
//! directly. The pending log keeps them in insertion order until the remote
//! service confirms each one.

use crate::{error::Result, Bookmark, BookmarkId, BookmarkPatch, Error, Timestamp};
use serde::{Deserialize, Serialize};

/// Unique identifier for an operation.
pub type OperationId = String;

/// Create a bookmark from a full snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOp {
    /// Operation ID
    pub op_id: OperationId,
    /// Snapshot of the bookmark as created locally
    pub bookmark: Bookmark,
}

/// Merge a partial field set into a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOp {
    /// Operation ID
    pub op_id: OperationId,
    /// Bookmark to update
    pub id: BookmarkId,
    /// Fields to merge
    pub patch: BookmarkPatch,
    /// Local time of the update, becomes `updated_at`
    pub timestamp: Timestamp,
}

/// Remove a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOp {
    /// Operation ID
    pub op_id: OperationId,
    /// Bookmark to delete
    pub id: BookmarkId,
    /// Local time of the delete
    pub timestamp: Timestamp,
}

/// A locally applied mutation waiting for remote confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PendingOperation {
    Create(CreateOp),
    Update(UpdateOp),
    Delete(DeleteOp),
}

impl PendingOperation {
    /// Get the operation ID.
    pub fn op_id(&self) -> &OperationId {
        match self {
            PendingOperation::Create(op) => &op.op_id,
            PendingOperation::Update(op) => &op.op_id,
            PendingOperation::Delete(op) => &op.op_id,
        }
    }

    /// Get the bookmark ID this operation targets.
    pub fn bookmark_id(&self) -> &BookmarkId {
        match self {
            PendingOperation::Create(op) => &op.bookmark.id,
            PendingOperation::Update(op) => &op.id,
            PendingOperation::Delete(op) => &op.id,
        }
    }

    /// Get the local timestamp of this operation.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            PendingOperation::Create(op) => op.bookmark.updated_at,
            PendingOperation::Update(op) => op.timestamp,
            PendingOperation::Delete(op) => op.timestamp,
        }
    }

    /// Short name of the operation kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PendingOperation::Create(_) => "create",
            PendingOperation::Update(_) => "update",
            PendingOperation::Delete(_) => "delete",
        }
    }
}

impl CreateOp {
    /// Create a new create operation.
    pub fn new(op_id: impl Into<OperationId>, bookmark: Bookmark) -> Self {
        Self {
            op_id: op_id.into(),
            bookmark,
        }
    }
}

impl UpdateOp {
    /// Create a new update operation.
    pub fn new(
        op_id: impl Into<OperationId>,
        id: impl Into<BookmarkId>,
        patch: BookmarkPatch,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            op_id: op_id.into(),
            id: id.into(),
            patch,
            timestamp,
        }
    }
}

impl DeleteOp {
    /// Create a new delete operation.
    pub fn new(
        op_id: impl Into<OperationId>,
        id: impl Into<BookmarkId>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            op_id: op_id.into(),
            id: id.into(),
            timestamp,
        }
    }
}

/// Serialize an ordered operation log to JSON.
pub fn encode_log(ops: &[PendingOperation]) -> Result<String> {
    serde_json::to_string(ops).map_err(|e| Error::InvalidLog(e.to_string()))
}

/// Deserialize an ordered operation log from JSON, preserving order.
pub fn decode_log(json: &str) -> Result<Vec<PendingOperation>> {
    serde_json::from_str(json).map_err(|e| Error::InvalidLog(e.to_string()))
}
