//! tierctl entry point
//!
//! Configuration comes from an optional JSON file and `TIER_*`
//! environment variables (a `.env` file is read if present).
//! Command-line flags override both.

use clap::Parser;
use tier_cli::{handler, Cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match handler::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    if cli.verbose {
        if let Err(e) = tier_storage::init_logging(&handler::verbose_logging(&config.logging)) {
            eprintln!("Warning: {}", e);
        }
    }

    if let Err(e) = handler::run(cli, config).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
