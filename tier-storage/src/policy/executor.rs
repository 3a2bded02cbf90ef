//! Auto-Hibernation Executor
//!
//! Runs a hibernation policy over an inventory. Dry runs only price the
//! candidates. Apply runs archive candidates with bounded parallelism;
//! a failed candidate is recorded and the batch carries on.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use tier_core::{
    plan_hibernation, CostEngine, FileRecord, FileStatus, HibernationCandidate,
    HibernationPolicyConfig, HibernationResult, TierError, TransitionedFile,
};

use crate::error::{StorageError, StorageResult};
use crate::jobs::{JobOutcome, JobTracker};
use crate::repository::FileFilter;

/// Executes auto-hibernation runs
pub struct AutoHibernationExecutor {
    tracker: Arc<JobTracker>,
    engine: CostEngine,
}

impl AutoHibernationExecutor {
    pub fn new(tracker: Arc<JobTracker>, engine: CostEngine) -> Self {
        Self { tracker, engine }
    }

    pub fn tracker(&self) -> &Arc<JobTracker> {
        &self.tracker
    }

    /// Run the policy over `inventory`.
    ///
    /// Only an invalid policy fails the call; per-file problems end up in
    /// `failures`.
    pub async fn run(
        &self,
        inventory: &[FileRecord],
        config: &HibernationPolicyConfig,
        now: DateTime<Utc>,
    ) -> StorageResult<HibernationResult> {
        let plan = plan_hibernation(inventory, config, &self.engine, now)?;
        let metrics = self.tracker.lifecycle().metrics();
        metrics.hibernation_runs.inc();

        info!(
            files = inventory.len(),
            candidates = plan.candidates_found(),
            dry_run = config.dry_run,
            "Auto-hibernation run started"
        );

        if config.dry_run {
            let result = plan.into_dry_run_result();
            info!(
                candidates = result.candidates_found,
                savings = %result.total_monthly_savings,
                "Dry run complete"
            );
            return Ok(result);
        }

        let mut result = HibernationResult::new(plan.candidates_found(), false);
        let outcomes: Vec<(HibernationCandidate, Result<FileStatus, TierError>)> =
            stream::iter(plan.candidates)
                .map(|candidate| async move {
                    let outcome = self.hibernate(&candidate).await;
                    (candidate, outcome)
                })
                .buffered(config.max_parallelism)
                .collect()
                .await;

        for (candidate, outcome) in outcomes {
            match outcome {
                Ok(status) => result.record_success(TransitionedFile {
                    id: candidate.id,
                    size_bytes: candidate.size_bytes,
                    savings: candidate.savings,
                    status,
                }),
                Err(err) => result.record_failure(candidate.id, &err),
            }
        }

        info!(
            candidates = result.candidates_found,
            transitioned = result.files_transitioned,
            failures = result.failures.len(),
            savings = %result.total_monthly_savings,
            "Auto-hibernation run complete"
        );
        Ok(result)
    }

    /// List the inventory from the repository, then run
    pub async fn run_from_repository(
        &self,
        filter: &FileFilter,
        config: &HibernationPolicyConfig,
        now: DateTime<Utc>,
    ) -> StorageResult<HibernationResult> {
        let inventory = self
            .tracker
            .lifecycle()
            .repository()
            .list_files(filter)
            .await?;
        self.run(&inventory, config, now).await
    }

    /// Archive one candidate and poll its job once.
    ///
    /// Returns the state the file ended in: `archived` if the backend
    /// already finished, `archiving` if the job is still running or its
    /// outcome is still tracked for `reconcile`.
    async fn hibernate(&self, candidate: &HibernationCandidate) -> Result<FileStatus, TierError> {
        let handle = self
            .tracker
            .begin_archive(&candidate.id, FileStatus::Active)
            .await
            .map_err(|err| failure_reason(&candidate.id, err))?;

        match self.tracker.poll_once(&handle).await {
            Ok(JobOutcome::Completed { status }) => Ok(status),
            Ok(JobOutcome::Pending) => {
                debug!(file_id = %candidate.id, job_id = %handle.job_id, "Archive still running");
                Ok(FileStatus::Archiving)
            }
            Ok(JobOutcome::Failed { reason }) => Err(TierError::external(&candidate.id, reason)),
            Err(err) if self.tracker.is_tracked(&handle.job_id).await => {
                warn!(file_id = %candidate.id, error = %err, "First poll failed; left to reconcile");
                Ok(FileStatus::Archiving)
            }
            Err(err) => Err(failure_reason(&candidate.id, err)),
        }
    }
}

fn failure_reason(file_id: &str, err: StorageError) -> TierError {
    match err {
        StorageError::Core(core) => core,
        other => TierError::external(file_id, other.to_string()),
    }
}
