//! Tier Storage - Collaborators, Jobs and Batch Execution
//!
//! Async half of the tiering engine:
//! - **Collaborators**: [`StorageBackend`], [`FileRepository`] and
//!   [`RateSource`] interfaces, with in-memory implementations
//! - **Lifecycle manager**: transitions applied through an atomic
//!   compare-and-set on the repository
//! - **Jobs**: archive/restore job handles, polled by `reconcile`
//! - **Policies**: batch auto-hibernation with bounded parallelism,
//!   bulk archive/restore of listed files, and stuck-upload repair
//! - **Config / telemetry**: layered configuration, structured logging,
//!   lifecycle metrics
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tier_storage::{EngineConfig, InMemoryFileRepository, InMemoryStorageBackend, TieringService};
//!
//! async fn example(files: Vec<tier_core::FileRecord>) -> tier_storage::StorageResult<()> {
//!     let service = TieringService::new(
//!         EngineConfig::load(None)?,
//!         Arc::new(InMemoryFileRepository::with_files(files.clone())),
//!         Arc::new(InMemoryStorageBackend::new()),
//!     )?;
//!
//!     let config = service.config().hibernation.clone();
//!     let result = service.hibernation().run(&files, &config, chrono::Utc::now()).await?;
//!     println!("{} candidates", result.candidates_found);
//!
//!     service.jobs().reconcile().await;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod jobs;
pub mod lifecycle;
pub mod policy;
pub mod rates;
pub mod repository;
pub mod service;
pub mod telemetry;

pub use backend::{InMemoryStorageBackend, JobScript, StorageBackend};
pub use config::{EngineConfig, JobConfig, PricingConfig};
pub use error::{StorageError, StorageResult};
pub use jobs::{JobOutcome, JobTracker, ReconcileReport};
pub use lifecycle::LifecycleManager;
pub use policy::{AutoHibernationExecutor, BulkOperations, BulkReport, UploadRepair, UploadRepairReport};
pub use rates::{RateSource, StaticRateSource};
pub use repository::{FileFilter, FileRepository, InMemoryFileRepository};
pub use service::TieringService;
pub use telemetry::{init_logging, LifecycleMetrics, LogConfig, LogFormat, LogLevel};
