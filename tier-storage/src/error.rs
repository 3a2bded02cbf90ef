//! Tier Storage Error Types

use thiserror::Error;
use tier_core::TierError;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Domain error from the lifecycle/cost/policy core
    #[error(transparent)]
    Core(#[from] TierError),

    /// File or job not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// File repository error
    #[error("Repository error: {0}")]
    Repository(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// The domain error, if this wraps one
    pub fn as_core(&self) -> Option<&TierError> {
        match self {
            StorageError::Core(err) => Some(err),
            _ => None,
        }
    }

    /// Whether retrying with refreshed state may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::Core(err) => err.is_retryable(),
            StorageError::Backend(_) | StorageError::Io(_) => true,
            _ => false,
        }
    }

    /// Whether this is an optimistic guard conflict
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::Core(TierError::ConcurrentModification { .. })
        )
    }
}
