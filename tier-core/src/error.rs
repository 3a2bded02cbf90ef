//! Tier Error Codes Registry
//!
//! Error code format: TIER-{module}-{sequence}
//! - TIER-LC: Lifecycle state machine errors
//! - TIER-CFG: Policy configuration errors
//! - TIER-RST: Restore tier errors
//! - TIER-EXT: External collaborator errors

use crate::lifecycle::FileStatus;
use thiserror::Error;

/// Tier Result type
pub type TierResult<T> = Result<T, TierError>;

/// Tier Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    // ============================================================
    // Lifecycle Errors (TIER-LC-*)
    // ============================================================
    /// [TIER-LC-001] Requested state change is not an edge in the lifecycle graph
    #[error("[TIER-LC-001] Invalid transition: {from} -> {to}")]
    InvalidTransition { from: FileStatus, to: FileStatus },

    /// [TIER-LC-002] Optimistic guard mismatch
    #[error("[TIER-LC-002] Concurrent modification of {file_id}: expected {expected}, found {actual}")]
    ConcurrentModification {
        file_id: String,
        expected: FileStatus,
        actual: FileStatus,
    },

    // ============================================================
    // Configuration Errors (TIER-CFG-*)
    // ============================================================
    /// [TIER-CFG-001] Invalid policy parameters
    #[error("[TIER-CFG-001] Configuration error: {reason}")]
    ConfigurationError { reason: String },

    // ============================================================
    // Restore Errors (TIER-RST-*)
    // ============================================================
    /// [TIER-RST-001] Restore tier key outside the enumerated set
    #[error("[TIER-RST-001] Unknown restore tier: {key:?}")]
    UnknownRestoreTier { key: String },

    // ============================================================
    // External Errors (TIER-EXT-*)
    // ============================================================
    /// [TIER-EXT-001] Storage backend reported failure for an archive/restore job
    #[error("[TIER-EXT-001] External operation failed for {file_id}: {reason}")]
    ExternalOperationFailure { file_id: String, reason: String },

    // ============================================================
    // General Errors
    // ============================================================
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid input
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl TierError {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        TierError::ConfigurationError {
            reason: reason.into(),
        }
    }

    /// Create an external operation failure
    pub fn external(file_id: impl Into<String>, reason: impl Into<String>) -> Self {
        TierError::ExternalOperationFailure {
            file_id: file_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error for a file
    pub fn file_not_found(file_id: impl Into<String>) -> Self {
        TierError::NotFound {
            entity: "File".to_string(),
            id: file_id.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            TierError::InvalidTransition { .. } => "TIER-LC-001",
            TierError::ConcurrentModification { .. } => "TIER-LC-002",
            TierError::ConfigurationError { .. } => "TIER-CFG-001",
            TierError::UnknownRestoreTier { .. } => "TIER-RST-001",
            TierError::ExternalOperationFailure { .. } => "TIER-EXT-001",
            TierError::NotFound { .. } => "TIER-GEN-404",
            TierError::InvalidInput { .. } => "TIER-GEN-400",
        }
    }

    /// Whether the caller may retry with refreshed state.
    ///
    /// Invalid transitions are never retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TierError::ConcurrentModification { .. } | TierError::ExternalOperationFailure { .. }
        )
    }
}
