//! Satchel - cookie-backed session store server
//!
//! Main entry point for the Satchel CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use satchel_config::LoggingSection;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;

use commands::{config, keygen, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Satchel - cookie-backed session store server
#[derive(Parser)]
#[command(name = "satchel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the session server
    Start(start::StartArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate session identifiers
    Keygen(keygen::KeygenArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `start --config` replaces discovery for logging too
    let explicit = match &cli.command {
        Commands::Start(args) => args.config.as_deref(),
        _ => None,
    };
    let loaded = commands::resolve_config(explicit)?;

    let _guard = init_tracing(cli.verbose, loaded.config.logging_or_default());

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config: loaded,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
        Commands::Keygen(args) => keygen::run(args, &ctx).await,
    }
}

/// Console (human-readable) + optional rotating JSON file.
///
/// The returned guard flushes the file writer and must outlive the command.
fn init_tracing(verbose: bool, logging: LoggingSection) -> Option<WorkerGuard> {
    let console_filter = if verbose {
        "satchel=debug,satchel_session=debug,satchel_server=debug,satchel_config=debug,info"
    } else {
        "satchel=info,satchel_session=info,satchel_server=info,warn"
    };

    let (file_writer, guard) = if logging.file {
        let log_dir = logging
            .directory
            .or_else(|| satchel_config::config_dir().map(|d| d.join("logs")))
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "satchel.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        (Some(writer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(console_filter)),
        )
        .with(file_writer.map(|writer| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new(
                    "satchel=trace,satchel_session=trace,satchel_server=trace,satchel_config=trace,info",
                ))
        }))
        .init();

    guard
}
