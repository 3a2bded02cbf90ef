//! File records
//!
//! The record itself is owned by an external repository; the engine only
//! reads it and writes `status` (plus the bookkeeping that goes with it).

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tier::StorageTier;
use crate::lifecycle::FileStatus;

/// Bytes per GiB
pub const BYTES_PER_GIB: u64 = 1 << 30;

/// Seconds per day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// A stored file as seen by the tiering engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque identifier
    pub id: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Owning user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Size in bytes
    pub size_bytes: u64,
    /// Lifecycle state; records without one are taken as stored and awake
    #[serde(default = "default_record_status")]
    pub status: FileStatus,
    /// Last time the file was read or downloaded
    pub last_accessed: DateTime<Utc>,
    /// MIME type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Storage class reported by the backend, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<StorageTier>,
    /// Source state of the in-flight (or failed) operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<FileStatus>,
}

impl FileRecord {
    /// Create a new record
    pub fn new(
        id: impl Into<String>,
        size_bytes: u64,
        status: FileStatus,
        last_accessed: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            owner: None,
            size_bytes,
            status,
            last_accessed,
            content_type: None,
            storage_class: None,
            origin: None,
        }
    }

    /// Set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set owning user
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Whether the file belongs to `owner`; `None` matches every file
    pub fn is_owned_by(&self, owner: Option<&str>) -> bool {
        match owner {
            Some(owner) => self.owner.as_deref() == Some(owner),
            None => true,
        }
    }

    /// Set content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the backend-reported storage class
    pub fn with_storage_class(mut self, tier: StorageTier) -> Self {
        self.storage_class = Some(tier);
        self
    }

    /// Storage tier the file is billed at.
    ///
    /// An explicit storage class wins; otherwise cold states bill as
    /// deep-archive and everything else as standard.
    pub fn storage_tier(&self) -> StorageTier {
        if let Some(tier) = self.storage_class {
            return tier;
        }
        match self.status {
            FileStatus::Archived | FileStatus::Restoring => StorageTier::DeepArchive,
            _ => StorageTier::Standard,
        }
    }

    /// Size in GiB, unrounded
    pub fn size_gb(&self) -> Decimal {
        bytes_to_gb(self.size_bytes)
    }

    /// Time since last access
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_accessed
    }

    /// Whole days since last access (floor, never negative)
    pub fn days_since_access(&self, now: DateTime<Utc>) -> i64 {
        self.idle_for(now).num_seconds().max(0) / SECONDS_PER_DAY
    }

    /// Set `status` and keep `origin` consistent with it
    pub fn apply_status(&mut self, next: FileStatus) {
        if next.is_in_flight() {
            self.origin = Some(self.status);
        } else if next != FileStatus::Failed {
            self.origin = None;
        }
        if matches!(
            next,
            FileStatus::Active | FileStatus::Archived | FileStatus::Restored
        ) {
            // Backend placement changed; the reported class is stale
            self.storage_class = None;
        }
        self.status = next;
    }

    /// Whether the content type starts with any of the prefixes
    pub fn content_type_matches(&self, prefixes: &[String]) -> bool {
        match &self.content_type {
            Some(ct) => prefixes.iter().any(|p| ct.starts_with(p.as_str())),
            None => false,
        }
    }
}

fn default_record_status() -> FileStatus {
    FileStatus::Active
}

/// Convert bytes to GiB without rounding
pub fn bytes_to_gb(bytes: u64) -> Decimal {
    Decimal::from(bytes) / Decimal::from(BYTES_PER_GIB)
}
