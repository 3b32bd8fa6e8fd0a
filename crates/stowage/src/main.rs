//! Stowage CLI binary.
//!
//! This binary provides command-line access to the configured storage backend:
//! - Store files and print their keys
//! - Fetch, remove and locate stored objects
//! - Generate keys

use clap::Parser;
use stowage::{StorageService, StowageConfig};
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, handle_command};

    // Load .env before reading STOWAGE_* overrides
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Backend selection failures abort start-up
    let options = StowageConfig::load(cli.config.as_deref())?;
    let service = StorageService::from_options(&options)?;

    handle_command(&service, cli.command).await?;

    Ok(())
}
