//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod audit;
mod migrate;
mod serve;

use archivist::config::{load_settings, LoadOptions};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "archivist")]
#[command(about = "Archive ingest and pipeline orchestration core")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Data directory (overrides config file and defaults).
    #[arg(short, long, global = true)]
    data_dir: Option<std::path::PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup, before clap parses).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP surface (ingest, processor, catalog) plus the audit scheduler.
    Serve {
        /// Address to bind to (host:port).
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,
    },

    /// Run one audit sweep synchronously and print the per-pass report.
    Audit,

    /// Apply schema migrations and exit.
    Migrate,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    };
    let settings = load_settings(options).await;
    settings.ensure_directories()?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Audit => audit::cmd_audit(&settings).await,
        Commands::Migrate => migrate::cmd_migrate(&settings).await,
    }
}
