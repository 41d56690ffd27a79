//! Configuration system for the Satchel session server.
//!
//! Provides TOML-based configuration with:
//! - A `[session]` section driving the session manager (cookie, max-age, GC)
//! - A `[server]` section for the HTTP listener
//! - A `[logging]` section for the rolling log file
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, Layers, LoadedConfig, config_dir, load_config, load_config_file, save_config,
    user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
