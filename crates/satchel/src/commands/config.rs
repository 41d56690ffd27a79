//! Config command - configuration management.

use anyhow::Result;
use clap::{Args, Subcommand};

use satchel_config::{self, SatchelConfig, ServerSection, SessionSection};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./satchel.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local, force } => cmd_init(local, force),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.config;
    let config = &loaded.config;

    if ctx.json_output {
        let session = config.session_or_default();
        let server = config.server_or_default();
        let max_age = session.to_manager_config()?.effective_max_age();
        let value = serde_json::json!({
            "sources": loaded.loaded_from(),
            "session": {
                "cookie_name": session.cookie_name,
                "max_age_secs": max_age.as_secs(),
                "gc_interval_secs": session.gc_interval_secs,
                "unknown_id_policy": session.unknown_id_policy,
            },
            "server": {
                "bind": server.bind,
                "port": server.port,
                "request_logging": server.request_logging,
            },
            "warnings": loaded.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("# Satchel Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let session = config.session_or_default();
    let manager = session.to_manager_config()?;
    println!("Session:");
    println!("  cookie: {}", manager.cookie_name);
    println!("  max age: {}s", manager.effective_max_age().as_secs());
    println!("  gc interval: {}s", manager.gc_interval.as_secs());
    println!("  unknown ids: {:?}", manager.unknown_id_policy);
    println!();

    let server = config.server_or_default();
    println!("Server:");
    println!("  bind: {}:{}", server.bind, server.port);
    println!("  request logging: {}", server.request_logging);
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = &ctx.config;

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    println!("CLI flags override all config files.");
    Ok(())
}

fn cmd_init(local: bool, force: bool) -> Result<()> {
    let path = if local {
        std::path::PathBuf::from(satchel_config::discovery::PROJECT_FILE)
    } else {
        satchel_config::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    let config = SatchelConfig {
        session: Some(SessionSection::default()),
        server: Some(ServerSection::default()),
        logging: None,
    };
    satchel_config::save_config(&config, &path)?;

    println!("Created {}", path.display());
    Ok(())
}

fn cmd_path() -> Result<()> {
    match satchel_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => anyhow::bail!("Could not determine config directory"),
    }
    Ok(())
}
