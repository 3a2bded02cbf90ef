//! File repository
//!
//! The external store that owns file records. The engine only reads
//! records and writes `status` through an atomic compare-and-set.

#[cfg(test)]
pub(crate) mod contended;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tier_core::{FileRecord, FileStatus};

use crate::error::StorageResult;

pub use memory::InMemoryFileRepository;

/// Selection criteria for `list_files`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    /// Only files in this state
    pub status: Option<FileStatus>,
    /// Only files whose content type starts with this prefix
    pub content_type_prefix: Option<String>,
    /// Only files strictly larger than this
    pub min_size_bytes: Option<u64>,
    /// Only files belonging to this user
    pub owner: Option<String>,
}

impl FileFilter {
    /// Match every file
    pub fn all() -> Self {
        Self::default()
    }

    /// Match files in one state
    pub fn with_status(status: FileStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Narrow to one user's files
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn matches(&self, file: &FileRecord) -> bool {
        if !file.is_owned_by(self.owner.as_deref()) {
            return false;
        }
        if let Some(status) = self.status {
            if file.status != status {
                return false;
            }
        }
        if let Some(prefix) = &self.content_type_prefix {
            match &file.content_type {
                Some(ct) if ct.starts_with(prefix.as_str()) => {}
                _ => return false,
            }
        }
        if let Some(min) = self.min_size_bytes {
            if file.size_bytes <= min {
                return false;
            }
        }
        true
    }
}

/// File repository interface
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Files matching the filter, in insertion order
    async fn list_files(&self, filter: &FileFilter) -> StorageResult<Vec<FileRecord>>;

    /// A single file
    async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>>;

    /// Insert or replace a file
    async fn insert_file(&self, file: FileRecord) -> StorageResult<()>;

    /// Remove a file if it is still in `expected`.
    ///
    /// Returns `false` without removing anything when the stored state
    /// differs.
    async fn remove_file(&self, file_id: &str, expected: FileStatus) -> StorageResult<bool>;

    /// Atomically set `status` to `next` if it still equals `expected`.
    ///
    /// Returns `false` when the stored state differs. Two concurrent calls
    /// with the same `expected` never both succeed.
    async fn compare_and_set_status(
        &self,
        file_id: &str,
        expected: FileStatus,
        next: FileStatus,
    ) -> StorageResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_filter_matches() {
        let file = FileRecord::new("f", 100, FileStatus::Active, Utc::now()).with_content_type("video/mp4");

        assert!(FileFilter::all().matches(&file));
        assert!(FileFilter::with_status(FileStatus::Active).matches(&file));
        assert!(!FileFilter::with_status(FileStatus::Archived).matches(&file));

        let media = FileFilter {
            content_type_prefix: Some("video/".into()),
            min_size_bytes: Some(99),
            ..Default::default()
        };
        assert!(media.matches(&file));

        let too_big = FileFilter {
            min_size_bytes: Some(100),
            ..Default::default()
        };
        assert!(!too_big.matches(&file));
    }

    #[test]
    fn test_filter_by_owner() {
        let mine = FileRecord::new("a", 1, FileStatus::Uploading, Utc::now()).with_owner("alice");
        let theirs = FileRecord::new("b", 1, FileStatus::Uploading, Utc::now()).with_owner("bob");

        let filter = FileFilter::with_status(FileStatus::Uploading).owned_by("alice");
        assert!(filter.matches(&mine));
        assert!(!filter.matches(&theirs));
        assert!(FileFilter::all().matches(&theirs));
    }
}
