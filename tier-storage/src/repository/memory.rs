//! In-memory file repository
//!
//! Insertion-ordered, thread-safe. Compare-and-set runs under a single
//! write lock, which makes it atomic with respect to every other call.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use tier_core::{FileRecord, FileStatus};

use super::{FileFilter, FileRepository};
use crate::error::{StorageError, StorageResult};

#[derive(Debug, Default)]
struct Inner {
    order: Vec<String>,
    files: HashMap<String, FileRecord>,
}

/// In-memory file repository
#[derive(Debug, Default)]
pub struct InMemoryFileRepository {
    inner: RwLock<Inner>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository seeded with an inventory
    pub fn with_files(files: impl IntoIterator<Item = FileRecord>) -> Self {
        let mut inner = Inner::default();
        for file in files {
            if !inner.files.contains_key(&file.id) {
                inner.order.push(file.id.clone());
            }
            inner.files.insert(file.id.clone(), file);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Every file, in insertion order
    pub async fn snapshot(&self) -> Vec<FileRecord> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.files.get(id).cloned())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.files.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn list_files(&self, filter: &FileFilter) -> StorageResult<Vec<FileRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.files.get(id))
            .filter(|file| filter.matches(file))
            .cloned()
            .collect())
    }

    async fn get_file(&self, file_id: &str) -> StorageResult<Option<FileRecord>> {
        Ok(self.inner.read().await.files.get(file_id).cloned())
    }

    async fn insert_file(&self, file: FileRecord) -> StorageResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.files.contains_key(&file.id) {
            inner.order.push(file.id.clone());
        }
        inner.files.insert(file.id.clone(), file);
        Ok(())
    }

    async fn remove_file(&self, file_id: &str, expected: FileStatus) -> StorageResult<bool> {
        let mut inner = self.inner.write().await;
        let status = inner
            .files
            .get(file_id)
            .map(|file| file.status)
            .ok_or_else(|| StorageError::NotFound(format!("file {file_id}")))?;

        if status != expected {
            return Ok(false);
        }
        inner.files.remove(file_id);
        inner.order.retain(|id| id != file_id);
        Ok(true)
    }

    async fn compare_and_set_status(
        &self,
        file_id: &str,
        expected: FileStatus,
        next: FileStatus,
    ) -> StorageResult<bool> {
        let mut inner = self.inner.write().await;
        let file = inner
            .files
            .get_mut(file_id)
            .ok_or_else(|| StorageError::NotFound(format!("file {file_id}")))?;

        if file.status != expected {
            return Ok(false);
        }
        file.apply_status(next);
        Ok(true)
    }
}
