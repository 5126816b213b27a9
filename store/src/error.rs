//! Errors returned by account stores and the vote edge log.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Another account already holds the username.
    #[error("username already taken: {0}")]
    Duplicate(String),

    /// The backend could not serve the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored account or vote edge could not be decoded.
    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    /// Whether the same operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
