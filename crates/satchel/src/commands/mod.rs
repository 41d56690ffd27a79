//! CLI command handlers.

pub mod config;
pub mod keygen;
pub mod start;

use std::path::Path;

use anyhow::{Context as _, Result};
use satchel_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Configuration resolved once at startup. Logging and the command share it.
    pub config: LoadedConfig,
}

/// Load an explicit config file, or discover the layered ones.
pub fn resolve_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    match explicit {
        Some(path) => {
            LoadedConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(satchel_config::load_config()),
    }
}
