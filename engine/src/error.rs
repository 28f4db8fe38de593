//! Error types for the marks engine.

use crate::BookmarkId;
use thiserror::Error;

/// All possible errors from the marks engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("validation failed: {0}")]
    Validation(String),

    // Lookup errors
    #[error("bookmark not found: {0}")]
    NotFound(BookmarkId),

    // Encoding errors
    #[error("invalid operation log: {0}")]
    InvalidLog(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::NotFound("bm-1".into());
        assert_eq!(err.to_string(), "bookmark not found: bm-1");

        let err = Error::Validation("title must not be empty".into());
        assert_eq!(err.to_string(), "validation failed: title must not be empty");

        let err = Error::InvalidLog("expected value at line 1 column 1".into());
        assert_eq!(
            err.to_string(),
            "invalid operation log: expected value at line 1 column 1"
        );
    }
}
