//! Stuck upload repair
//!
//! Files left in `uploading` (client went away after the bytes landed)
//! are promoted to `active` through guarded transitions.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tier_core::FileStatus;

use crate::error::StorageResult;
use crate::lifecycle::LifecycleManager;
use crate::repository::FileFilter;

/// Outcome of a repair pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRepairReport {
    pub found: usize,
    pub repaired: Vec<String>,
    pub failures: Vec<(String, String)>,
    pub dry_run: bool,
}

/// Promotes stuck uploads to `active`
pub struct UploadRepair {
    lifecycle: LifecycleManager,
}

impl UploadRepair {
    pub fn new(lifecycle: LifecycleManager) -> Self {
        Self { lifecycle }
    }

    /// Repair every stuck upload, or only `owner`'s
    pub async fn run(&self, owner: Option<&str>, dry_run: bool) -> StorageResult<UploadRepairReport> {
        let mut filter = FileFilter::with_status(FileStatus::Uploading);
        if let Some(owner) = owner {
            filter = filter.owned_by(owner);
        }
        let stuck = self.lifecycle.repository().list_files(&filter).await?;

        let mut report = UploadRepairReport {
            found: stuck.len(),
            dry_run,
            ..Default::default()
        };
        if dry_run {
            info!(found = report.found, "Stuck uploads found (dry run)");
            return Ok(report);
        }

        for file in stuck {
            match self
                .lifecycle
                .attempt_transition(&file.id, FileStatus::Uploading, FileStatus::Active)
                .await
            {
                Ok(_) => report.repaired.push(file.id),
                Err(err) => {
                    warn!(file_id = %file.id, error = %err, "Could not repair upload");
                    report.failures.push((file.id, err.to_string()));
                }
            }
        }

        info!(
            found = report.found,
            repaired = report.repaired.len(),
            "Stuck uploads repaired"
        );
        Ok(report)
    }
}
