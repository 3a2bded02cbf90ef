//! Repository whose compare-and-set loses to another writer once

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use tier_core::{FileRecord, FileStatus};

use super::{FileFilter, FileRepository, InMemoryFileRepository};
use crate::error::{StorageError, StorageResult};

/// What happens to the first compare-and-set leaving `contended`
#[derive(Debug, Clone, Copy)]
pub enum Contention {
    /// Another writer moves the file to this state first
    Interloper(FileStatus),
    /// The store is briefly unreachable
    Unavailable,
}

pub struct ContendedRepository {
    inner: InMemoryFileRepository,
    contended: FileStatus,
    contention: Contention,
    armed: AtomicBool,
}

impl ContendedRepository {
    pub fn new(files: Vec<FileRecord>, contended: FileStatus, contention: Contention) -> Self {
        Self {
            inner: InMemoryFileRepository::with_files(files),
            contended,
            contention,
            armed: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl FileRepository for ContendedRepository {
    async fn list_files(&self, filter: &FileFilter) -> StorageResult<Vec<FileRecord>> {
        self.inner.list_files(filter).await
    }

    async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>> {
        self.inner.get_file(file_id).await
    }

    async fn insert_file(&self, file: FileRecord) -> StorageResult<()> {
        self.inner.insert_file(file).await
    }

    async fn remove_file(&self, file_id: &str, expected: FileStatus) -> StorageResult<bool> {
        self.inner.remove_file(file_id, expected).await
    }

    async fn compare_and_set_status(
        &self,
        file_id: &str,
        expected: FileStatus,
        next: FileStatus,
    ) -> StorageResult<bool> {
        if expected == self.contended && self.armed.swap(false, Ordering::SeqCst) {
            match self.contention {
                Contention::Interloper(status) => {
                    self.inner.compare_and_set_status(file_id, expected, status).await?;
                }
                Contention::Unavailable => {
                    return Err(StorageError::Repository("connection reset".to_string()));
                }
            }
        }
        self.inner.compare_and_set_status(file_id, expected, next).await
    }
}
