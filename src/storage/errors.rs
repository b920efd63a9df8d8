//! Storage gateway errors
//!
//! Failures propagate verbatim; the gateway never retries.

use thiserror::Error;

/// Result type for gateway operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage gateway errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Key does not exist
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Backend unreachable or returned an error
    #[error("Storage backend unavailable: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Stable code for logs and API bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "OM_KEY_NOT_FOUND",
            Self::Backend(_) => "OM_BACKEND_UNAVAILABLE",
        }
    }
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}
