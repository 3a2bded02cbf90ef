//! Archive/Restore Job Tracker
//!
//! Entering `archiving`/`restoring` is the only synchronous step of an
//! archive or restore. The backend job runs on its own; `reconcile` polls
//! tracked jobs once each and applies finished ones as separate guarded
//! transitions. Nothing here waits for a job to finish.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use tier_core::{
    select_restore_tier, FileRecord, FileStatus, JobHandle, JobStatus, LifecycleStateMachine,
    TierError,
};

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::lifecycle::LifecycleManager;

/// Result of polling one job once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Still running; still tracked
    Pending,
    /// Completed and applied; the file is now in `status`
    Completed { status: FileStatus },
    /// Backend reported failure; the file is now `failed`
    Failed { reason: String },
}

/// One pass of `reconcile`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Jobs polled in this pass
    pub polled: usize,
    /// Files whose job completed
    pub completed: Vec<String>,
    /// Files whose job failed, with the backend's reason
    pub failed: Vec<(String, String)>,
    /// Jobs still running
    pub still_pending: usize,
    /// Jobs that could not be polled or applied
    pub errors: Vec<(String, String)>,
}

/// Tracks in-flight archive/restore jobs
pub struct JobTracker {
    lifecycle: LifecycleManager,
    backend: Arc<dyn StorageBackend>,
    jobs: RwLock<Vec<JobHandle>>,
    max_polls_per_pass: usize,
}

impl JobTracker {
    pub fn new(lifecycle: LifecycleManager, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            lifecycle,
            backend,
            jobs: RwLock::new(Vec::new()),
            max_polls_per_pass: usize::MAX,
        }
    }

    /// Bound the number of jobs polled per `reconcile` pass
    pub fn with_max_polls_per_pass(mut self, max: usize) -> Self {
        self.max_polls_per_pass = max.max(1);
        self
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Jobs currently tracked, oldest first
    pub async fn tracked_jobs(&self) -> Vec<JobHandle> {
        self.jobs.read().await.clone()
    }

    /// Enter `archiving` and start the backend job.
    ///
    /// `expected` is the caller's view of the file's state (`active` or
    /// `restored`). If the backend refuses the job the file moves to
    /// `failed` and `ExternalOperationFailure` is returned.
    pub async fn begin_archive(&self, file_id: &str, expected: FileStatus) -> StorageResult<JobHandle> {
        self.lifecycle
            .attempt_transition(file_id, expected, FileStatus::Archiving)
            .await?;

        match self.backend.begin_archive(file_id).await {
            Ok(handle) => {
                self.lifecycle.metrics().archive_jobs_started.inc();
                self.track(handle.clone()).await;
                info!(file_id, job_id = %handle.job_id, "Archive started");
                Ok(handle)
            }
            Err(err) => Err(self.refused(file_id, FileStatus::Archiving, err).await),
        }
    }

    /// Resolve the restore tier, enter `restoring` and start the job.
    ///
    /// An unknown tier key fails before anything is touched.
    pub async fn begin_restore(&self, file_id: &str, restore_tier: &str) -> StorageResult<JobHandle> {
        let info = select_restore_tier(restore_tier)?;

        self.lifecycle
            .attempt_transition(file_id, FileStatus::Archived, FileStatus::Restoring)
            .await?;

        match self.backend.begin_restore(file_id, info.tier).await {
            Ok(handle) => {
                self.lifecycle.metrics().restore_jobs_started.inc();
                self.track(handle.clone()).await;
                info!(
                    file_id,
                    job_id = %handle.job_id,
                    tier = %info.tier,
                    window = %info.window_label(),
                    "Restore started"
                );
                Ok(handle)
            }
            Err(err) => Err(self.refused(file_id, FileStatus::Restoring, err).await),
        }
    }

    /// Poll one job and apply its outcome if it has finished.
    ///
    /// A job stays tracked until its outcome is applied or the file has
    /// left the job's in-flight state; on any other error the next
    /// `reconcile` polls it again.
    pub async fn poll_once(&self, handle: &JobHandle) -> StorageResult<JobOutcome> {
        let status = self.backend.poll_job(handle).await?;

        let outcome = match status {
            JobStatus::Pending => return Ok(JobOutcome::Pending),
            JobStatus::Succeeded => {
                let target = handle.kind.completed_status();
                self.apply_outcome(handle, target).await?;
                self.lifecycle.metrics().jobs_succeeded.inc();
                debug!(file_id = %handle.file_id, job_id = %handle.job_id, "Job completed");
                JobOutcome::Completed { status: target }
            }
            JobStatus::Failed { reason } => {
                self.apply_outcome(handle, FileStatus::Failed).await?;
                self.lifecycle.metrics().jobs_failed.inc();
                warn!(file_id = %handle.file_id, job_id = %handle.job_id, reason = %reason, "Job failed");
                JobOutcome::Failed { reason }
            }
        };
        Ok(outcome)
    }

    /// Whether a job is still tracked
    pub async fn is_tracked(&self, job_id: &str) -> bool {
        self.jobs.read().await.iter().any(|h| h.job_id == job_id)
    }

    /// Poll every tracked job once and apply finished ones
    pub async fn reconcile(&self) -> ReconcileReport {
        let handles: Vec<JobHandle> = self
            .tracked_jobs()
            .await
            .into_iter()
            .take(self.max_polls_per_pass)
            .collect();

        let mut report = ReconcileReport::default();
        for handle in handles {
            report.polled += 1;
            match self.poll_once(&handle).await {
                Ok(JobOutcome::Pending) => report.still_pending += 1,
                Ok(JobOutcome::Completed { .. }) => report.completed.push(handle.file_id),
                Ok(JobOutcome::Failed { reason }) => report.failed.push((handle.file_id, reason)),
                Err(err) => {
                    warn!(file_id = %handle.file_id, error = %err, "Reconcile could not apply job");
                    report.errors.push((handle.file_id, err.to_string()));
                }
            }
        }

        info!(
            polled = report.polled,
            completed = report.completed.len(),
            failed = report.failed.len(),
            pending = report.still_pending,
            "Reconcile pass finished"
        );
        report
    }

    /// Move a failed file back into the source state of the failed operation
    pub async fn retry(&self, file_id: &str) -> StorageResult<FileStatus> {
        let file = self.lifecycle.require_file(file_id).await?;
        let target = LifecycleStateMachine::retry_target(&file)?;
        self.lifecycle
            .attempt_transition(file_id, FileStatus::Failed, target)
            .await
    }

    /// Remove a file that has not started uploading
    pub async fn cancel(&self, file_id: &str) -> StorageResult<FileRecord> {
        let file = self.lifecycle.require_file(file_id).await?;
        if !LifecycleStateMachine::can_cancel(file.status) {
            return Err(TierError::InvalidTransition {
                from: file.status,
                to: FileStatus::Pending,
            }
            .into());
        }

        if !self
            .lifecycle
            .repository()
            .remove_file(file_id, FileStatus::Pending)
            .await?
        {
            let actual = self.lifecycle.require_file(file_id).await?.status;
            return Err(TierError::ConcurrentModification {
                file_id: file_id.to_string(),
                expected: FileStatus::Pending,
                actual,
            }
            .into());
        }

        info!(file_id, "Pending file cancelled");
        Ok(file)
    }

    async fn apply_outcome(&self, handle: &JobHandle, target: FileStatus) -> StorageResult<()> {
        let in_flight = handle.kind.in_flight_status();
        let applied = self
            .lifecycle
            .attempt_transition(&handle.file_id, in_flight, target)
            .await;

        let settled = match &applied {
            Ok(_) => true,
            Err(StorageError::Core(TierError::ConcurrentModification { actual, .. })) => {
                *actual != in_flight
            }
            Err(StorageError::Core(TierError::NotFound { .. })) | Err(StorageError::NotFound(_)) => true,
            Err(_) => false,
        };
        if settled {
            self.untrack(&handle.job_id).await;
        }
        if let Err(err) = &applied {
            warn!(
                file_id = %handle.file_id,
                job_id = %handle.job_id,
                error = %err,
                still_tracked = !settled,
                "Could not apply job outcome"
            );
        }
        applied.map(|_| ())
    }

    async fn track(&self, handle: JobHandle) {
        let mut jobs = self.jobs.write().await;
        jobs.push(handle);
        self.lifecycle.metrics().jobs_in_flight.set(jobs.len() as i64);
    }

    async fn untrack(&self, job_id: &str) {
        let mut jobs = self.jobs.write().await;
        jobs.retain(|h| h.job_id != job_id);
        self.lifecycle.metrics().jobs_in_flight.set(jobs.len() as i64);
    }

    /// Backend refused to start a job: record the failure on the file
    async fn refused(&self, file_id: &str, in_flight: FileStatus, err: StorageError) -> StorageError {
        self.lifecycle.metrics().jobs_failed.inc();
        warn!(file_id, error = %err, "Backend refused job");
        if let Err(mark_err) = self
            .lifecycle
            .attempt_transition(file_id, in_flight, FileStatus::Failed)
            .await
        {
            warn!(file_id, error = %mark_err, "Could not mark file failed");
        }
        TierError::external(file_id, err.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryStorageBackend, JobScript};
    use crate::repository::contended::{Contention, ContendedRepository};
    use crate::repository::InMemoryFileRepository;
    use crate::telemetry::LifecycleMetrics;
    use chrono::Utc;
    use tier_core::{JobKind, RestoreTier};

    struct Fixture {
        tracker: JobTracker,
        backend: Arc<InMemoryStorageBackend>,
        repo: Arc<InMemoryFileRepository>,
    }

    fn fixture(files: Vec<(&str, FileStatus)>) -> Fixture {
        let repo = Arc::new(InMemoryFileRepository::with_files(
            files
                .into_iter()
                .map(|(id, status)| FileRecord::new(id, 1 << 30, status, Utc::now())),
        ));
        let backend = Arc::new(InMemoryStorageBackend::new());
        let lifecycle = LifecycleManager::new(repo.clone(), Arc::new(LifecycleMetrics::new()));
        Fixture {
            tracker: JobTracker::new(lifecycle, backend.clone()),
            backend,
            repo,
        }
    }

    async fn status(fx: &Fixture, id: &str) -> FileStatus {
        use crate::repository::FileRepository;
        fx.repo.get_file(id).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn test_archive_then_reconcile() {
        let fx = fixture(vec![("f", FileStatus::Active)]);
        fx.backend.script("f", JobScript::SucceedAfter(1)).await;

        fx.tracker.begin_archive("f", FileStatus::Active).await.unwrap();
        assert_eq!(status(&fx, "f").await, FileStatus::Archiving);

        let first = fx.tracker.reconcile().await;
        assert_eq!(first.still_pending, 1);
        assert_eq!(status(&fx, "f").await, FileStatus::Archiving);

        let second = fx.tracker.reconcile().await;
        assert_eq!(second.completed, vec!["f".to_string()]);
        assert_eq!(status(&fx, "f").await, FileStatus::Archived);
        assert!(fx.tracker.tracked_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_refused_archive_marks_failed() {
        let fx = fixture(vec![("f", FileStatus::Active)]);
        fx.backend.script("f", JobScript::Refuse("quota exceeded".into())).await;

        let err = fx.tracker.begin_archive("f", FileStatus::Active).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Core(TierError::ExternalOperationFailure { .. })
        ));
        assert_eq!(status(&fx, "f").await, FileStatus::Failed);
        assert_eq!(fx.tracker.retry("f").await.unwrap(), FileStatus::Active);
    }

    #[tokio::test]
    async fn test_restore_flow() {
        let fx = fixture(vec![("f", FileStatus::Archived)]);

        let handle = fx.tracker.begin_restore("f", "BULK").await.unwrap();
        assert_eq!(handle.kind, JobKind::Restore { tier: RestoreTier::Bulk });
        assert_eq!(status(&fx, "f").await, FileStatus::Restoring);

        let outcome = fx.tracker.poll_once(&handle).await.unwrap();
        assert_eq!(outcome, JobOutcome::Completed { status: FileStatus::Restored });

        // Re-hibernation from restored
        fx.tracker.begin_archive("f", FileStatus::Restored).await.unwrap();
        assert_eq!(status(&fx, "f").await, FileStatus::Archiving);
    }

    #[tokio::test]
    async fn test_unknown_restore_tier_touches_nothing() {
        let fx = fixture(vec![("f", FileStatus::Archived)]);
        let err = fx.tracker.begin_restore("f", "instant").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Core(TierError::UnknownRestoreTier { .. })
        ));
        assert_eq!(status(&fx, "f").await, FileStatus::Archived);
        assert!(fx.backend.started_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_restore_requires_archived() {
        let fx = fixture(vec![("f", FileStatus::Active)]);
        let err = fx.tracker.begin_restore("f", "standard").await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_failed_job_then_retry() {
        let fx = fixture(vec![("f", FileStatus::Archived)]);
        fx.backend.script("f", JobScript::Fail("glacier timeout".into())).await;

        fx.tracker.begin_restore("f", "standard").await.unwrap();
        let report = fx.tracker.reconcile().await;
        assert_eq!(report.failed, vec![("f".to_string(), "glacier timeout".to_string())]);
        assert_eq!(status(&fx, "f").await, FileStatus::Failed);

        assert_eq!(fx.tracker.retry("f").await.unwrap(), FileStatus::Archived);
    }

    #[tokio::test]
    async fn test_retry_requires_failed() {
        let fx = fixture(vec![("f", FileStatus::Active)]);
        assert!(fx.tracker.retry("f").await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_only_pending() {
        let fx = fixture(vec![("p", FileStatus::Pending), ("a", FileStatus::Archiving)]);

        let removed = fx.tracker.cancel("p").await.unwrap();
        assert_eq!(removed.id, "p");
        assert_eq!(fx.repo.len().await, 1);

        let err = fx.tracker.cancel("a").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Core(TierError::InvalidTransition { .. })
        ));
    }

    fn contended_tracker(contention: Contention) -> (JobTracker, Arc<ContendedRepository>) {
        let repo = Arc::new(ContendedRepository::new(
            vec![FileRecord::new("f", 1 << 30, FileStatus::Active, Utc::now())],
            FileStatus::Archiving,
            contention,
        ));
        let lifecycle = LifecycleManager::new(repo.clone(), Arc::new(LifecycleMetrics::new()));
        let tracker = JobTracker::new(lifecycle, Arc::new(InMemoryStorageBackend::new()));
        (tracker, repo)
    }

    #[tokio::test]
    async fn test_stale_outcome_is_dropped() {
        use crate::repository::FileRepository;
        let (tracker, repo) = contended_tracker(Contention::Interloper(FileStatus::Failed));

        let handle = tracker.begin_archive("f", FileStatus::Active).await.unwrap();
        let err = tracker.poll_once(&handle).await.unwrap_err();
        assert!(err.is_conflict());

        // The file left archiving behind the job's back; nothing left to apply
        assert!(!tracker.is_tracked(&handle.job_id).await);
        assert_eq!(repo.get_file("f").await.unwrap().unwrap().status, FileStatus::Failed);
        assert_eq!(tracker.lifecycle().metrics().jobs_in_flight.get(), 0);
    }

    #[tokio::test]
    async fn test_unapplied_outcome_stays_tracked() {
        use crate::repository::FileRepository;
        let (tracker, repo) = contended_tracker(Contention::Unavailable);

        let handle = tracker.begin_archive("f", FileStatus::Active).await.unwrap();
        assert!(tracker.poll_once(&handle).await.is_err());
        assert!(tracker.is_tracked(&handle.job_id).await);
        assert_eq!(repo.get_file("f").await.unwrap().unwrap().status, FileStatus::Archiving);

        let report = tracker.reconcile().await;
        assert_eq!(report.completed, vec!["f".to_string()]);
        assert_eq!(repo.get_file("f").await.unwrap().unwrap().status, FileStatus::Archived);
        assert!(tracker.tracked_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_bounded() {
        let fx = fixture(vec![("a", FileStatus::Active), ("b", FileStatus::Active)]);
        let tracker = fx.tracker.with_max_polls_per_pass(1);
        tracker.begin_archive("a", FileStatus::Active).await.unwrap();
        tracker.begin_archive("b", FileStatus::Active).await.unwrap();

        let report = tracker.reconcile().await;
        assert_eq!(report.polled, 1);
        assert_eq!(report.completed, vec!["a".to_string()]);
        assert_eq!(tracker.tracked_jobs().await.len(), 1);
    }
}
