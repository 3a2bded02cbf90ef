//! Lifecycle Manager
//!
//! Applies lifecycle transitions to files held by a repository. Every
//! write goes through the repository's compare-and-set, so a transition
//! computed from a stale read is rejected instead of overwriting.

use std::sync::Arc;
use tracing::{debug, warn};

use tier_core::{FileRecord, FileStatus, LifecycleStateMachine, TierError};

use crate::error::{StorageError, StorageResult};
use crate::repository::FileRepository;
use crate::telemetry::LifecycleMetrics;

/// Guarded lifecycle transitions over a repository
#[derive(Clone)]
pub struct LifecycleManager {
    repository: Arc<dyn FileRepository>,
    metrics: Arc<LifecycleMetrics>,
}

impl LifecycleManager {
    pub fn new(repository: Arc<dyn FileRepository>, metrics: Arc<LifecycleMetrics>) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    pub fn repository(&self) -> &Arc<dyn FileRepository> {
        &self.repository
    }

    pub fn metrics(&self) -> &Arc<LifecycleMetrics> {
        &self.metrics
    }

    /// Fetch a file or fail with `NotFound`
    pub async fn require_file(&self, file_id: &str) -> StorageResult<FileRecord> {
        self.repository
            .get_file(file_id)
            .await?
            .ok_or_else(|| TierError::file_not_found(file_id).into())
    }

    /// Move `file_id` from `expected` to `target`.
    ///
    /// The edge is validated first; an illegal edge fails with
    /// `InvalidTransition` whatever the stored state is. A stored state
    /// other than `expected` fails with `ConcurrentModification`.
    pub async fn attempt_transition(
        &self,
        file_id: &str,
        expected: FileStatus,
        target: FileStatus,
    ) -> StorageResult<FileStatus> {
        let validation = if expected == FileStatus::Failed {
            let file = self.require_file(file_id).await?;
            LifecycleStateMachine::validate_retry(expected, file.origin, target)
        } else {
            LifecycleStateMachine::validate(expected, target)
        };
        if let Err(err) = validation {
            self.metrics.transitions_rejected.inc();
            warn!(file_id, from = %expected, to = %target, "Rejected invalid transition");
            return Err(err.into());
        }

        if self
            .repository
            .compare_and_set_status(file_id, expected, target)
            .await?
        {
            self.metrics.transitions_applied.inc();
            debug!(file_id, from = %expected, to = %target, "Transition applied");
            return Ok(target);
        }

        self.metrics.guard_conflicts.inc();
        let actual = self.require_file(file_id).await?.status;
        debug!(file_id, expected = %expected, actual = %actual, "Transition lost to concurrent modification");
        Err(StorageError::Core(TierError::ConcurrentModification {
            file_id: file_id.to_string(),
            expected,
            actual,
        }))
    }
}
