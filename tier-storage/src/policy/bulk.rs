//! Bulk archive and restore
//!
//! Starts archive or restore jobs for an explicit list of files. A file
//! that is missing, owned by someone else or in the wrong state is
//! recorded as a failure and the rest of the request carries on. Jobs are
//! only started here; `reconcile` applies their outcomes.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use tier_core::{select_restore_tier, FileStatus, HibernationFailure, RestoreTier, TierError};

use crate::error::StorageResult;
use crate::jobs::JobTracker;

/// Outcome of a bulk request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReport {
    /// Ids in the request, duplicates included
    pub total_requested: usize,
    /// Files whose job was started, in request order
    pub started: Vec<String>,
    pub failures: Vec<HibernationFailure>,
    /// Tier of a bulk restore
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore_tier: Option<RestoreTier>,
}

impl BulkReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum BulkAction {
    Archive,
    Restore(RestoreTier),
}

/// Bulk archive/restore over the job tracker
pub struct BulkOperations {
    tracker: Arc<JobTracker>,
    max_parallelism: usize,
}

impl BulkOperations {
    pub fn new(tracker: Arc<JobTracker>, max_parallelism: usize) -> Self {
        Self {
            tracker,
            max_parallelism: max_parallelism.max(1),
        }
    }

    /// Start archive jobs for `file_ids`, optionally limited to `owner`'s files
    pub async fn archive(&self, file_ids: &[String], owner: Option<&str>) -> StorageResult<BulkReport> {
        self.execute(file_ids, owner, BulkAction::Archive).await
    }

    /// Start restore jobs for `file_ids` at `restore_tier`.
    ///
    /// An unknown tier fails the whole request before any file is touched.
    pub async fn restore(
        &self,
        file_ids: &[String],
        restore_tier: &str,
        owner: Option<&str>,
    ) -> StorageResult<BulkReport> {
        let info = select_restore_tier(restore_tier)?;
        self.execute(file_ids, owner, BulkAction::Restore(info.tier))
            .await
    }

    async fn execute(
        &self,
        file_ids: &[String],
        owner: Option<&str>,
        action: BulkAction,
    ) -> StorageResult<BulkReport> {
        if file_ids.is_empty() {
            return Err(TierError::InvalidInput {
                reason: "no file ids provided".to_string(),
            }
            .into());
        }

        let mut unique: Vec<&str> = Vec::with_capacity(file_ids.len());
        for id in file_ids {
            if !unique.contains(&id.as_str()) {
                unique.push(id.as_str());
            }
        }

        let outcomes: Vec<(&str, StorageResult<()>)> = stream::iter(unique)
            .map(|id| async move { (id, self.start(id, owner, action).await) })
            .buffered(self.max_parallelism)
            .collect()
            .await;

        let mut report = BulkReport {
            total_requested: file_ids.len(),
            started: Vec::new(),
            failures: Vec::new(),
            restore_tier: match action {
                BulkAction::Archive => None,
                BulkAction::Restore(tier) => Some(tier),
            },
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => report.started.push(id.to_string()),
                Err(err) => {
                    warn!(file_id = id, error = %err, "Bulk item failed");
                    report.failures.push(HibernationFailure {
                        id: id.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            action = ?action,
            requested = report.total_requested,
            started = report.started.len(),
            failures = report.failures.len(),
            "Bulk request finished"
        );
        Ok(report)
    }

    async fn start(&self, file_id: &str, owner: Option<&str>, action: BulkAction) -> StorageResult<()> {
        let file = self.tracker.lifecycle().require_file(file_id).await?;
        if !file.is_owned_by(owner) {
            // Other users' files are indistinguishable from missing ones
            return Err(TierError::file_not_found(file_id).into());
        }

        match action {
            BulkAction::Archive => {
                self.tracker.begin_archive(file_id, file.status).await?;
            }
            BulkAction::Restore(tier) => {
                if file.status != FileStatus::Archived {
                    return Err(TierError::InvalidTransition {
                        from: file.status,
                        to: FileStatus::Restoring,
                    }
                    .into());
                }
                self.tracker.begin_restore(file_id, tier.key()).await?;
            }
        }
        Ok(())
    }
}
