//! Command-line interface for RBAC
//!
//! Access checks, assignment queries and assignment management against a
//! store kept in a TOML snapshot file.

use anyhow::{Context, Result};
use clap::Parser;
use rbac_cli::{execute, Command};
use rbac_core::RbacConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rbac")]
#[command(about = "RBAC - Hierarchical Role-Based Access Control", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Store snapshot file
    #[arg(short, long, global = true, default_value = "rbac.toml")]
    store: PathBuf,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RbacConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over both the flag and the config file
    let log_level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let output = execute(cli.command, &cli.store, &config).await?;
    for line in output.lines {
        println!("{line}");
    }
    Ok(())
}
