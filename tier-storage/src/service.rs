//! Service wiring
//!
//! Builds the lifecycle manager, job tracker and batch executors over a
//! repository and backend from one validated configuration.

use std::sync::Arc;

use crate::backend::StorageBackend;
use crate::config::EngineConfig;
use crate::error::StorageResult;
use crate::jobs::JobTracker;
use crate::lifecycle::LifecycleManager;
use crate::policy::{AutoHibernationExecutor, BulkOperations, UploadRepair};
use crate::rates::{RateSource, StaticRateSource};
use crate::repository::FileRepository;
use crate::telemetry::LifecycleMetrics;

/// Engine components sharing one repository, backend and metrics bundle
pub struct TieringService {
    config: EngineConfig,
    rates: StaticRateSource,
    metrics: Arc<LifecycleMetrics>,
    tracker: Arc<JobTracker>,
    hibernation: AutoHibernationExecutor,
    bulk: BulkOperations,
    uploads: UploadRepair,
}

impl TieringService {
    pub fn new(
        config: EngineConfig,
        repository: Arc<dyn FileRepository>,
        backend: Arc<dyn StorageBackend>,
    ) -> StorageResult<Self> {
        config.validate()?;
        let rates = config.rate_source()?;
        let metrics = Arc::new(LifecycleMetrics::new());
        let lifecycle = LifecycleManager::new(repository, metrics.clone());
        let tracker = Arc::new(
            JobTracker::new(lifecycle.clone(), backend)
                .with_max_polls_per_pass(config.jobs.max_polls_per_pass),
        );
        let hibernation = AutoHibernationExecutor::new(tracker.clone(), config.cost_engine());
        let bulk = BulkOperations::new(tracker.clone(), config.hibernation.max_parallelism);

        Ok(Self {
            config,
            rates,
            metrics,
            tracker,
            hibernation,
            bulk,
            uploads: UploadRepair::new(lifecycle),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rates(&self) -> &dyn RateSource {
        &self.rates
    }

    pub fn metrics(&self) -> &Arc<LifecycleMetrics> {
        &self.metrics
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        self.tracker.lifecycle()
    }

    pub fn jobs(&self) -> &Arc<JobTracker> {
        &self.tracker
    }

    pub fn hibernation(&self) -> &AutoHibernationExecutor {
        &self.hibernation
    }

    pub fn bulk(&self) -> &BulkOperations {
        &self.bulk
    }

    pub fn uploads(&self) -> &UploadRepair {
        &self.uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryStorageBackend;
    use crate::repository::InMemoryFileRepository;
    use rust_decimal::Decimal;

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.hibernation.max_parallelism = 0;
        let result = TieringService::new(
            config,
            Arc::new(InMemoryFileRepository::new()),
            Arc::new(InMemoryStorageBackend::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_wires_rates() {
        let service = TieringService::new(
            EngineConfig::default(),
            Arc::new(InMemoryFileRepository::new()),
            Arc::new(InMemoryStorageBackend::new()),
        )
        .unwrap();
        assert_eq!(service.rates().tax_rate(), Decimal::from(18));
        assert_eq!(service.metrics().hibernation_runs.get(), 0);
    }
}
