//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `crawl_pulse` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use crawl_pulse::initialization::init_logger_with;
use crawl_pulse::{run_server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments into Config
    let config = Config::parse();

    // Initialize logger based on config
    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    if let Err(e) = run_server(config).await {
        eprintln!("crawl_pulse error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
