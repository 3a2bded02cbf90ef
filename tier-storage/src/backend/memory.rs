//! In-memory storage backend
//!
//! Used for tests and CLI simulations. Job outcomes are scripted per file,
//! so a test can make a backend succeed immediately, stay pending, fail,
//! or refuse to start a job.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use tier_core::{JobHandle, JobKind, JobStatus, RestoreTier, StorageTier};

use super::traits::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// Scripted outcome of jobs started for a file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobScript {
    /// Succeeded on the first poll
    #[default]
    Succeed,
    /// Pending for this many polls, then succeeded
    SucceedAfter(u32),
    /// Pending forever
    Pending,
    /// Failed on the first poll
    Fail(String),
    /// Job refused when starting
    Refuse(String),
}

#[derive(Debug)]
struct TrackedJob {
    handle: JobHandle,
    script: JobScript,
    polls: u32,
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct InMemoryStorageBackend {
    tiers: RwLock<HashMap<String, StorageTier>>,
    jobs: RwLock<HashMap<String, TrackedJob>>,
    scripts: RwLock<HashMap<String, JobScript>>,
    default_script: JobScript,
}

impl InMemoryStorageBackend {
    /// Backend whose jobs succeed on the first poll
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend applying `script` to files without their own
    pub fn with_default_script(script: JobScript) -> Self {
        Self {
            default_script: script,
            ..Default::default()
        }
    }

    /// Script the outcome of jobs for one file
    pub async fn script(&self, file_id: &str, script: JobScript) {
        self.scripts.write().await.insert(file_id.to_string(), script);
    }

    /// Set the storage class held for a file
    pub async fn set_tier(&self, file_id: &str, tier: StorageTier) {
        self.tiers.write().await.insert(file_id.to_string(), tier);
    }

    /// Handles of every job started so far
    pub async fn started_jobs(&self) -> Vec<JobHandle> {
        let mut handles: Vec<JobHandle> = self
            .jobs
            .read()
            .await
            .values()
            .map(|job| job.handle.clone())
            .collect();
        handles.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        handles
    }

    async fn script_for(&self, file_id: &str) -> JobScript {
        self.scripts
            .read()
            .await
            .get(file_id)
            .cloned()
            .unwrap_or_else(|| self.default_script.clone())
    }

    async fn start(&self, file_id: &str, kind: JobKind) -> StorageResult<JobHandle> {
        let script = self.script_for(file_id).await;
        if let JobScript::Refuse(reason) = &script {
            return Err(StorageError::Backend(reason.clone()));
        }

        let handle = JobHandle::new(format!("job-{}", uuid::Uuid::new_v4()), file_id, kind);
        debug!(file_id, job_id = %handle.job_id, kind = kind.name(), "Job accepted");

        self.jobs.write().await.insert(
            handle.job_id.clone(),
            TrackedJob {
                handle: handle.clone(),
                script,
                polls: 0,
            },
        );
        Ok(handle)
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorageBackend {
    async fn get_tier(&self, file_id: &str) -> StorageResult<StorageTier> {
        Ok(self
            .tiers
            .read()
            .await
            .get(file_id)
            .copied()
            .unwrap_or(StorageTier::Standard))
    }

    async fn begin_archive(&self, file_id: &str) -> StorageResult<JobHandle> {
        self.start(file_id, JobKind::Archive).await
    }

    async fn begin_restore(&self, file_id: &str, tier: RestoreTier) -> StorageResult<JobHandle> {
        self.start(file_id, JobKind::Restore { tier }).await
    }

    async fn poll_job(&self, handle: &JobHandle) -> StorageResult<JobStatus> {
        let status = {
            let mut jobs = self.jobs.write().await;
            let job = jobs
                .get_mut(&handle.job_id)
                .ok_or_else(|| StorageError::NotFound(format!("job {}", handle.job_id)))?;
            job.polls += 1;

            match &job.script {
                JobScript::Succeed => JobStatus::Succeeded,
                JobScript::SucceedAfter(n) if job.polls > *n => JobStatus::Succeeded,
                JobScript::SucceedAfter(_) | JobScript::Pending => JobStatus::Pending,
                JobScript::Fail(reason) | JobScript::Refuse(reason) => JobStatus::Failed {
                    reason: reason.clone(),
                },
            }
        };

        if status == JobStatus::Succeeded {
            let tier = match handle.kind {
                JobKind::Archive => StorageTier::DeepArchive,
                JobKind::Restore { .. } => StorageTier::Standard,
            };
            self.set_tier(&handle.file_id, tier).await;
        }

        Ok(status)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
