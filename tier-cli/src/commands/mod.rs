//! CLI Commands Module
//!
//! Command definitions for `tierctl`.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Storage tiering engine CLI
#[derive(Parser, Debug)]
#[command(name = "tierctl")]
#[command(version)]
#[command(about = "Storage lifecycle and tiering cost command line interface")]
#[command(long_about = "Suggest files to hibernate, price an inventory across storage tiers, \
    inspect restore tiers and run batch hibernation over a JSON inventory file.")]
pub struct Cli {
    /// Engine configuration file (JSON); TIER_* variables override it
    #[arg(short, long, env = "TIER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (json, table)
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Table format (human-readable)
    #[default]
    Table,
}

/// Heuristic threshold overrides shared by several commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ThresholdArgs {
    /// Idle days a file must exceed
    #[arg(long)]
    pub days: Option<i64>,

    /// Size in bytes a file must exceed
    #[arg(long = "min-size")]
    pub min_size: Option<i64>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the hibernation heuristic for every file
    Suggest {
        /// Inventory file (JSON array of file records)
        #[arg(short, long)]
        inventory: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },

    /// Monthly cost breakdown per storage tier
    Costs {
        /// Inventory file (JSON array of file records)
        #[arg(short, long)]
        inventory: PathBuf,

        /// Tax rate in percent
        #[arg(long = "tax-rate")]
        tax_rate: Option<Decimal>,

        /// Rate preset (usd, inr)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Show timing and cost multiplier of a restore tier
    RestoreTier {
        /// Restore tier key (expedited, standard, bulk)
        key: String,
    },

    /// Archive every dormant file in the inventory
    Hibernate {
        /// Inventory file (JSON array of file records)
        #[arg(short, long)]
        inventory: PathBuf,

        #[command(flatten)]
        thresholds: ThresholdArgs,

        /// Plan only (true) or apply transitions (false)
        #[arg(long = "dry-run")]
        dry_run: Option<bool>,

        /// Concurrent archive operations
        #[arg(long)]
        parallelism: Option<usize>,

        /// Only this user's files
        #[arg(long)]
        owner: Option<String>,

        /// Write the updated inventory back to the file
        #[arg(long)]
        write: bool,
    },

    /// Promote files stuck in `uploading` to `active`
    RepairUploads {
        /// Inventory file (JSON array of file records)
        #[arg(short, long)]
        inventory: PathBuf,

        /// Report only (true) or repair (false)
        #[arg(long = "dry-run")]
        dry_run: Option<bool>,

        /// Only this user's files
        #[arg(long)]
        owner: Option<String>,

        /// Write the updated inventory back to the file
        #[arg(long)]
        write: bool,
    },

    /// Archive the listed files
    BulkArchive {
        /// Inventory file (JSON array of file records)
        #[arg(short, long)]
        inventory: PathBuf,

        /// File ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Only this user's files
        #[arg(long)]
        owner: Option<String>,

        /// Write the updated inventory back to the file
        #[arg(long)]
        write: bool,
    },

    /// Restore the listed files
    BulkRestore {
        /// Inventory file (JSON array of file records)
        #[arg(short, long)]
        inventory: PathBuf,

        /// File ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Restore tier key (expedited, standard, bulk)
        #[arg(long, default_value = "standard")]
        tier: String,

        /// Only this user's files
        #[arg(long)]
        owner: Option<String>,

        /// Write the updated inventory back to the file
        #[arg(long)]
        write: bool,
    },
}
