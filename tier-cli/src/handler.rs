//! Command Handlers
//!
//! Each command loads the engine configuration, applies its flag
//! overrides, and runs against an in-memory repository seeded from the
//! inventory file.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use tier_core::{
    select_restore_tier, suggest, CostBreakdown, Currency, FileRecord, HibernationResult,
    PotentialSavings, RestoreTierInfo, Suggestion,
};
use tier_storage::{
    BulkReport, EngineConfig, FileFilter, InMemoryFileRepository, InMemoryStorageBackend,
    LogConfig, LogLevel, TieringService, UploadRepairReport,
};

use crate::commands::{Cli, Commands, ThresholdArgs};
use crate::error::{CliError, CliResult};
use crate::inventory::{load_inventory, save_inventory};
use crate::output;

/// Costs plus what hibernating the standard tier would save
#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    pub breakdown: CostBreakdown,
    pub potential_savings: PotentialSavings,
}

/// Which files a bulk command acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkCommand<'a> {
    Archive,
    Restore { tier: &'a str },
}

/// Run the CLI with parsed arguments and the loaded configuration
pub async fn run(cli: Cli, config: EngineConfig) -> CliResult<()> {
    let now = Utc::now();

    match cli.command {
        Commands::Suggest {
            inventory,
            thresholds,
        } => {
            let files = load_inventory(&inventory)?;
            let suggestions = handle_suggest(config, &files, &thresholds, now)?;
            output::print_suggestions(&suggestions, cli.format);
        }
        Commands::Costs {
            inventory,
            tax_rate,
            currency,
        } => {
            let files = load_inventory(&inventory)?;
            let report = handle_costs(config, &files, tax_rate, currency.as_deref())?;
            output::print_costs(&report, cli.format);
        }
        Commands::RestoreTier { key } => {
            let info = handle_restore_tier(&key)?;
            output::print_restore_tier(&info, cli.format);
        }
        Commands::Hibernate {
            inventory,
            thresholds,
            dry_run,
            parallelism,
            owner,
            write,
        } => {
            let mut config = config;
            apply_thresholds(&mut config, &thresholds);
            if let Some(dry_run) = dry_run {
                config.hibernation.dry_run = dry_run;
            }
            if let Some(parallelism) = parallelism {
                config.hibernation.max_parallelism = parallelism;
            }
            let result = handle_hibernate(config, &inventory, owner.as_deref(), write, now).await?;
            output::print_hibernation(&result, cli.format);
        }
        Commands::RepairUploads {
            inventory,
            dry_run,
            owner,
            write,
        } => {
            let dry_run = dry_run.unwrap_or(config.hibernation.dry_run);
            let report =
                handle_repair_uploads(config, &inventory, owner.as_deref(), dry_run, write).await?;
            output::print_upload_repair(&report, cli.format);
        }
        Commands::BulkArchive {
            inventory,
            ids,
            owner,
            write,
        } => {
            let report =
                handle_bulk(config, &inventory, &ids, BulkCommand::Archive, owner.as_deref(), write)
                    .await?;
            output::print_bulk(&report, cli.format);
        }
        Commands::BulkRestore {
            inventory,
            ids,
            tier,
            owner,
            write,
        } => {
            let command = BulkCommand::Restore { tier: &tier };
            let report =
                handle_bulk(config, &inventory, &ids, command, owner.as_deref(), write).await?;
            output::print_bulk(&report, cli.format);
        }
    }
    Ok(())
}

/// Logging for `--verbose`: at least debug, under the CLI's own target
pub fn verbose_logging(config: &LogConfig) -> LogConfig {
    let mut logging = config.clone().with_service_name("tier-cli");
    if matches!(logging.level, LogLevel::Info | LogLevel::Warn | LogLevel::Error) {
        logging.level = LogLevel::Debug;
    }
    logging
}

/// Defaults, the optional file, then `TIER_*` variables
pub fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(CliError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
    }
    Ok(EngineConfig::load(path)?)
}

fn apply_thresholds(config: &mut EngineConfig, args: &ThresholdArgs) {
    if let Some(days) = args.days {
        config.hibernation.days_threshold = days;
    }
    if let Some(min_size) = args.min_size {
        config.hibernation.min_size_bytes = min_size;
    }
}

/// Evaluate the heuristic for every file
pub fn handle_suggest(
    mut config: EngineConfig,
    files: &[FileRecord],
    args: &ThresholdArgs,
    now: DateTime<Utc>,
) -> CliResult<Vec<Suggestion>> {
    apply_thresholds(&mut config, args);
    let thresholds = config.hibernation.validate()?;
    debug!(
        days_threshold = thresholds.days_threshold,
        min_size_bytes = thresholds.min_size_bytes,
        "Evaluating suggestions"
    );
    Ok(files.iter().map(|f| suggest(f, now, &thresholds)).collect())
}

/// Price an inventory
pub fn handle_costs(
    mut config: EngineConfig,
    files: &[FileRecord],
    tax_rate: Option<Decimal>,
    currency: Option<&str>,
) -> CliResult<CostReport> {
    if let Some(currency) = currency {
        config.pricing.currency = currency.parse::<Currency>()?;
    }
    if let Some(tax_rate) = tax_rate {
        config.pricing.tax_rate = tax_rate;
    }
    config.validate()?;

    let engine = config.cost_engine();
    let breakdown = engine.compute_cost_breakdown(files, config.pricing.tax_rate)?;
    let potential_savings = engine.potential_savings(files)?;
    Ok(CostReport {
        breakdown,
        potential_savings,
    })
}

/// Look up a restore tier by key
pub fn handle_restore_tier(key: &str) -> CliResult<RestoreTierInfo> {
    Ok(select_restore_tier(key)?)
}

/// Run batch hibernation over an inventory file
pub async fn handle_hibernate(
    config: EngineConfig,
    inventory: &Path,
    owner: Option<&str>,
    write: bool,
    now: DateTime<Utc>,
) -> CliResult<HibernationResult> {
    let (service, repo) = open(config, inventory)?;
    let policy = service.config().hibernation.clone();
    let filter = match owner {
        Some(owner) => FileFilter::all().owned_by(owner),
        None => FileFilter::all(),
    };

    let result = service
        .hibernation()
        .run_from_repository(&filter, &policy, now)
        .await?;

    if !result.dry_run {
        let report = service.jobs().reconcile().await;
        debug!(
            completed = report.completed.len(),
            still_pending = report.still_pending,
            "Reconciled archive jobs"
        );
        if write {
            save_inventory(inventory, &repo.snapshot().await)?;
            info!(path = %inventory.display(), "Inventory updated");
        }
    }
    Ok(result)
}

/// Repair stuck uploads in an inventory file
pub async fn handle_repair_uploads(
    config: EngineConfig,
    inventory: &Path,
    owner: Option<&str>,
    dry_run: bool,
    write: bool,
) -> CliResult<UploadRepairReport> {
    let (service, repo) = open(config, inventory)?;
    let report = service.uploads().run(owner, dry_run).await?;

    if !dry_run && write {
        save_inventory(inventory, &repo.snapshot().await)?;
        info!(path = %inventory.display(), "Inventory updated");
    }
    Ok(report)
}

/// Start archive or restore jobs for the listed files and settle them
pub async fn handle_bulk(
    config: EngineConfig,
    inventory: &Path,
    ids: &[String],
    command: BulkCommand<'_>,
    owner: Option<&str>,
    write: bool,
) -> CliResult<BulkReport> {
    let (service, repo) = open(config, inventory)?;
    let report = match command {
        BulkCommand::Archive => service.bulk().archive(ids, owner).await?,
        BulkCommand::Restore { tier } => service.bulk().restore(ids, tier, owner).await?,
    };

    let settled = service.jobs().reconcile().await;
    debug!(
        completed = settled.completed.len(),
        still_pending = settled.still_pending,
        "Reconciled bulk jobs"
    );
    if write && !report.started.is_empty() {
        save_inventory(inventory, &repo.snapshot().await)?;
        info!(path = %inventory.display(), "Inventory updated");
    }
    Ok(report)
}

fn open(
    config: EngineConfig,
    inventory: &Path,
) -> CliResult<(TieringService, Arc<InMemoryFileRepository>)> {
    let repo = Arc::new(InMemoryFileRepository::with_files(load_inventory(inventory)?));
    let service = TieringService::new(config, repo.clone(), Arc::new(InMemoryStorageBackend::new()))?;
    Ok((service, repo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tier_core::{FileStatus, RestoreTier, StorageTier, BYTES_PER_GIB};

    fn files(now: DateTime<Utc>) -> Vec<FileRecord> {
        vec![
            FileRecord::new("old-big", 10 * BYTES_PER_GIB, FileStatus::Active, now - Duration::days(40)),
            FileRecord::new("old-small", 1_000, FileStatus::Active, now - Duration::days(40)),
            FileRecord::new("fresh", 10 * BYTES_PER_GIB, FileStatus::Active, now - Duration::days(2)),
            FileRecord::new("upload", 2 * BYTES_PER_GIB, FileStatus::Uploading, now),
        ]
    }

    fn write_inventory(dir: &tempfile::TempDir, files: &[FileRecord]) -> std::path::PathBuf {
        let path = dir.path().join("files.json");
        save_inventory(&path, files).unwrap();
        path
    }

    #[test]
    fn test_suggest_with_overrides() {
        let now = Utc::now();
        let inventory = files(now);

        let defaults = handle_suggest(EngineConfig::default(), &inventory, &ThresholdArgs::default(), now).unwrap();
        let ids: Vec<_> = defaults.iter().filter(|s| s.suggested).map(|s| s.file_id.as_str()).collect();
        assert_eq!(ids, vec!["old-big"]);

        let args = ThresholdArgs {
            days: Some(60),
            min_size: None,
        };
        let stricter = handle_suggest(EngineConfig::default(), &inventory, &args, now).unwrap();
        assert!(stricter.iter().all(|s| !s.suggested));

        let invalid = ThresholdArgs {
            days: Some(0),
            min_size: None,
        };
        let err = handle_suggest(EngineConfig::default(), &inventory, &invalid, now).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_costs() {
        let now = Utc::now();
        let report = handle_costs(EngineConfig::default(), &files(now), Some(Decimal::ZERO), None).unwrap();
        let breakdown = &report.breakdown;

        assert_eq!(breakdown.tax_amount, Decimal::ZERO);
        assert_eq!(breakdown.total, breakdown.subtotal);
        assert_eq!(breakdown.tier(StorageTier::Standard).unwrap().files, 4);
        assert_eq!(report.potential_savings.eligible_files, 4);

        let inr = handle_costs(EngineConfig::default(), &files(now), None, Some("INR")).unwrap();
        assert_eq!(inr.breakdown.currency, Currency::Inr);
        assert_eq!(inr.breakdown.tax_rate, Decimal::from(18));

        assert!(handle_costs(EngineConfig::default(), &files(now), None, Some("eur")).is_err());
        assert!(handle_costs(EngineConfig::default(), &files(now), Some(Decimal::from(-5)), None).is_err());
    }

    #[test]
    fn test_restore_tier() {
        let info = handle_restore_tier("BULK").unwrap();
        assert_eq!(info.tier, RestoreTier::Bulk);
        assert_eq!(handle_restore_tier("instant").unwrap_err().exit_code(), 2);
    }

    #[tokio::test]
    async fn test_hibernate_dry_run_leaves_file_untouched() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let path = write_inventory(&dir, &files(now));
        let before = std::fs::read_to_string(&path).unwrap();

        let result = handle_hibernate(EngineConfig::default(), &path, None, true, now).await.unwrap();
        assert!(result.dry_run);
        assert_eq!(result.candidates_found, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_hibernate_apply_and_write() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let path = write_inventory(&dir, &files(now));

        let mut config = EngineConfig::default();
        config.hibernation.dry_run = false;
        let result = handle_hibernate(config, &path, None, true, now).await.unwrap();
        assert_eq!(result.files_transitioned, 1);
        assert!(result.total_monthly_savings > Decimal::ZERO);

        let saved = load_inventory(&path).unwrap();
        let big = saved.iter().find(|f| f.id == "old-big").unwrap();
        assert_eq!(big.status, FileStatus::Archived);
        assert_eq!(saved.len(), 4);
        assert_eq!(saved[0].id, "old-big");
    }

    #[tokio::test]
    async fn test_repair_uploads_write() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let path = write_inventory(&dir, &files(now));

        let report = handle_repair_uploads(EngineConfig::default(), &path, None, false, true).await.unwrap();
        assert_eq!(report.repaired, vec!["upload".to_string()]);

        let saved = load_inventory(&path).unwrap();
        assert!(saved.iter().all(|f| f.status == FileStatus::Active));
    }

    #[tokio::test]
    async fn test_hibernate_one_owner() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let old = now - Duration::days(40);
        let path = write_inventory(
            &dir,
            &[
                FileRecord::new("a", 10 * BYTES_PER_GIB, FileStatus::Active, old).with_owner("alice"),
                FileRecord::new("b", 10 * BYTES_PER_GIB, FileStatus::Active, old).with_owner("bob"),
            ],
        );

        let mut config = EngineConfig::default();
        config.hibernation.dry_run = false;
        let result = handle_hibernate(config, &path, Some("bob"), true, now).await.unwrap();
        assert_eq!(result.candidates_found, 1);

        let saved = load_inventory(&path).unwrap();
        assert_eq!(saved[0].status, FileStatus::Active);
        assert_eq!(saved[1].status, FileStatus::Archived);
    }

    #[tokio::test]
    async fn test_bulk_archive_then_restore() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let path = write_inventory(
            &dir,
            &[
                FileRecord::new("a", BYTES_PER_GIB, FileStatus::Active, now).with_owner("alice"),
                FileRecord::new("b", BYTES_PER_GIB, FileStatus::Active, now).with_owner("bob"),
            ],
        );
        let ids = vec!["a".to_string(), "b".to_string()];

        let report = handle_bulk(EngineConfig::default(), &path, &ids, BulkCommand::Archive, Some("alice"), true)
            .await
            .unwrap();
        assert_eq!(report.started, vec!["a".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].id, "b");

        let saved = load_inventory(&path).unwrap();
        assert_eq!(saved[0].status, FileStatus::Archived);
        assert_eq!(saved[1].status, FileStatus::Active);

        let restore = BulkCommand::Restore { tier: "expedited" };
        let report = handle_bulk(EngineConfig::default(), &path, &ids[..1], restore, None, true)
            .await
            .unwrap();
        assert_eq!(report.restore_tier, Some(RestoreTier::Expedited));
        assert_eq!(load_inventory(&path).unwrap()[0].status, FileStatus::Restored);
    }

    #[tokio::test]
    async fn test_bulk_restore_unknown_tier() {
        let now = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let path = write_inventory(&dir, &files(now));
        let before = std::fs::read_to_string(&path).unwrap();

        let restore = BulkCommand::Restore { tier: "instant" };
        let err = handle_bulk(EngineConfig::default(), &path, &["old-big".to_string()], restore, None, true)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_verbose_logging() {
        let logging = verbose_logging(&LogConfig::default());
        assert_eq!(logging.level, LogLevel::Debug);
        assert!(logging.default_directive().starts_with("tier_cli=debug,"));

        let configured = LogConfig {
            level: LogLevel::Trace,
            ..LogConfig::production()
        };
        let logging = verbose_logging(&configured);
        assert_eq!(logging.level, LogLevel::Trace);
        assert_eq!(logging.format, tier_storage::LogFormat::Json);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/tier.json"))).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }
}
