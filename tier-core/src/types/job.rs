//! Archive/restore job handles
//!
//! Archive and restore run for minutes to hours on the storage backend.
//! Starting one returns a handle; completion is learned later by polling
//! the handle and applied as its own guarded transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::FileStatus;
use crate::restore::RestoreTier;

/// Kind of long-running backend job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobKind {
    /// Move to the cold tier
    Archive,
    /// Bring back to the hot tier
    Restore { tier: RestoreTier },
}

impl JobKind {
    /// State the file is in while the job runs
    pub fn in_flight_status(&self) -> FileStatus {
        match self {
            JobKind::Archive => FileStatus::Archiving,
            JobKind::Restore { .. } => FileStatus::Restoring,
        }
    }

    /// State the file lands in when the job succeeds
    pub fn completed_status(&self) -> FileStatus {
        match self {
            JobKind::Archive => FileStatus::Archived,
            JobKind::Restore { .. } => FileStatus::Restored,
        }
    }

    /// Short name
    pub fn name(&self) -> &'static str {
        match self {
            JobKind::Archive => "archive",
            JobKind::Restore { .. } => "restore",
        }
    }
}

/// Ticket for a job accepted by the storage backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    /// Backend job identifier
    pub job_id: String,
    /// File the job operates on
    pub file_id: String,
    /// What the job does
    pub kind: JobKind,
    /// When the backend accepted the job
    pub started_at: DateTime<Utc>,
}

impl JobHandle {
    /// Create a new handle
    pub fn new(job_id: impl Into<String>, file_id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            job_id: job_id.into(),
            file_id: file_id.into(),
            kind,
            started_at: Utc::now(),
        }
    }
}

/// Job state as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    /// Still running
    Pending,
    /// Finished successfully
    Succeeded,
    /// Finished with an error
    Failed { reason: String },
}

impl JobStatus {
    /// Whether the job has finished either way
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}
