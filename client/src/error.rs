//! Unified error handling for the sync client.

use crate::config::ConfigError;
use crate::gateway::RemoteError;
use crate::storage::StorageError;

/// Client error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Validation or lookup failure, raised before any state changes.
    #[error(transparent)]
    Engine(#[from] marks_engine::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The remote rejected the call while online. The operation stays queued.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether this is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Engine(marks_engine::Error::Validation(_)))
    }

    /// Whether this is an unknown-id failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Engine(marks_engine::Error::NotFound(_)))
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
