//! Tier CLI - Command Line Interface
//!
//! `tierctl` runs the tiering engine over a JSON inventory file.
//!
//! # Usage
//!
//! ```text
//! tierctl [OPTIONS] <COMMAND>
//!
//! Commands:
//!   suggest         Evaluate the hibernation heuristic for every file
//!   costs           Monthly cost breakdown per storage tier
//!   restore-tier    Show timing and cost multiplier of a restore tier
//!   hibernate       Archive every dormant file in the inventory
//!   repair-uploads  Promote files stuck in `uploading` to `active`
//!   bulk-archive    Archive the listed files
//!   bulk-restore    Restore the listed files
//!
//! Options:
//!   -c, --config <FILE>    Engine configuration file (JSON)
//!   -f, --format <FORMAT>  Output format (json, table) [default: table]
//!   -v, --verbose          Enable verbose output
//! ```
//!
//! # Examples
//!
//! ```text
//! tierctl suggest --inventory files.json --days 60
//! tierctl costs --inventory files.json --currency inr --tax-rate 18
//! tierctl hibernate --inventory files.json --dry-run false --owner alice --write
//! tierctl bulk-restore --inventory files.json --ids a,b --tier bulk --write
//! ```

pub mod commands;
pub mod error;
pub mod handler;
pub mod inventory;
pub mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use error::{CliError, CliResult};

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
