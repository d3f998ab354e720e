//! # gympass
//!
//! Front-desk command line: member records, badge issuing and a scan loop
//! that reads barcode-scanner text from stdin.

mod args;
mod output;
mod run;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gympass_core::config::GymConfig;
use gympass_core::Gym;

use crate::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for replies and JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gympass_core=debug,gympass_store=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = GymConfig::from_env();
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    info!(db = %config.db_path.display(), "Opening gym database");

    let gym = Gym::open(config)?;
    run::dispatch(&gym, cli.command, cli.json).await
}
