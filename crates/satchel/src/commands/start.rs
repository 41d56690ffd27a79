//! Start command - launches the Satchel server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use satchel_config::SatchelConfig;
use satchel_server::{Server, ServerConfig};
use satchel_session::{ManagerConfig, SessionManager, UnknownIdPolicy};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Session cookie name (overrides config)
    #[arg(long)]
    pub cookie_name: Option<String>,

    /// Idle session lifetime in seconds (overrides config)
    #[arg(long)]
    pub max_age: Option<u64>,

    /// Seconds between GC sweeps (overrides config)
    #[arg(long)]
    pub gc_interval: Option<u64>,

    /// Always mint a new ID for cookies naming an unknown session
    #[arg(long)]
    pub regenerate_unknown: bool,

    /// Path to config file (replaces default discovery, logging included)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    // ── Load configuration ──────────────────────────────────────────────

    let loaded = &ctx.config;

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    let (session, server) = resolve_with_cli_overrides(&loaded.config, &args)?;

    // ── Build and run ───────────────────────────────────────────────────

    let manager = Arc::new(SessionManager::in_memory(session)?);

    if ctx.verbose {
        println!("Cookie: {}", manager.cookie_name());
        println!("Max age: {}s", manager.max_age().as_secs());
        println!("GC interval: {}s", manager.config().gc_interval.as_secs());
    }

    println!("Satchel listening on http://{}", server.bind_address);
    tracing::info!(addr = %server.bind_address, "Server starting");

    Server::new(manager, server).run().await?;
    Ok(())
}

/// Apply CLI overrides on top of the loaded config.
fn resolve_with_cli_overrides(
    config: &SatchelConfig,
    args: &StartArgs,
) -> Result<(ManagerConfig, ServerConfig)> {
    let mut session = config.session_or_default();
    if let Some(ref name) = args.cookie_name {
        session.cookie_name = name.clone();
    }
    if let Some(secs) = args.max_age {
        session.max_age_secs = secs;
    }
    if let Some(secs) = args.gc_interval {
        session.gc_interval_secs = secs;
    }
    if args.regenerate_unknown {
        session.unknown_id_policy = UnknownIdPolicy::Regenerate;
    }

    let mut server = config.server_or_default();
    if let Some(port) = args.port {
        server.port = port;
    }
    if let Some(ref bind) = args.bind {
        server.bind = bind.clone();
    }

    let manager_config = session.to_manager_config()?;
    let server_config = ServerConfig::new()
        .with_bind_address(server.socket_addr()?)
        .with_request_logging(server.request_logging);

    Ok((manager_config, server_config))
}
