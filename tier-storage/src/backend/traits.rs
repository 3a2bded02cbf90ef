//! Storage Backend Trait
//!
//! The cloud storage system that physically moves bytes between tiers.
//! Archive and restore are long-running: starting one returns a job handle
//! and completion is learned by polling it.

use async_trait::async_trait;
use tier_core::{JobHandle, JobStatus, RestoreTier, StorageTier};

use crate::error::StorageResult;

/// Storage backend interface
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Storage class the backend currently holds the file in
    async fn get_tier(&self, file_id: &str) -> StorageResult<StorageTier>;

    /// Start moving the file to the archival tier
    async fn begin_archive(&self, file_id: &str) -> StorageResult<JobHandle>;

    /// Start bringing the file back to the hot tier
    async fn begin_restore(&self, file_id: &str, tier: RestoreTier) -> StorageResult<JobHandle>;

    /// Current state of a job. Never blocks until completion.
    async fn poll_job(&self, handle: &JobHandle) -> StorageResult<JobStatus>;

    /// Backend identifier for logs
    fn backend_name(&self) -> &'static str;
}
