//! Remote gateway: the contract the sync coordinator consumes.
//!
//! The remote bookmark API itself lives elsewhere. Every call is idempotent
//! from the engine's point of view; see [`RemoteError::is_conflict`] and
//! [`RemoteError::is_not_found`] for how repeats are recognised.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use marks_engine::{Bookmark, BookmarkPatch};
use serde::Serialize;

/// Optional filters for a list call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl ListFilter {
    /// No filter: the full collection.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Request/response wrapper around the remote bookmark API.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch the collection (or a filtered part of it).
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Bookmark>, RemoteError>;

    /// Create a bookmark and return the server's canonical record.
    async fn create(&self, bookmark: &Bookmark) -> Result<Bookmark, RemoteError>;

    /// Merge fields into a bookmark and return the canonical record.
    async fn update(&self, id: &str, patch: &BookmarkPatch) -> Result<Bookmark, RemoteError>;

    /// Delete a bookmark.
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// Failure of a remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("remote returned status {0}")]
    Status(u16),

    #[error("remote call timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// 409: the server already holds this record.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RemoteError::Status(409))
    }

    /// 404: the server does not hold this record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Status(404))
    }
}
