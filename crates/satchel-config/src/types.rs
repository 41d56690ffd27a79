//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [session]     # cookie name, max-age, GC cadence
//! [server]      # listener settings
//! [logging]     # rolling log file
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use satchel_session::{DEFAULT_COOKIE_NAME, DEFAULT_GC_INTERVAL, ManagerConfig, UnknownIdPolicy};

use crate::{ConfigError, Result};

/// Default port for the HTTP listener.
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address for the HTTP listener.
pub const DEFAULT_BIND: &str = "127.0.0.1";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatchelConfig {
    /// Session manager configuration.
    pub session: Option<SessionSection>,

    /// HTTP server configuration.
    pub server: Option<ServerSection>,

    /// Log file configuration.
    pub logging: Option<LoggingSection>,
}

impl SatchelConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: SatchelConfig) {
        if other.session.is_some() {
            self.session = other.session;
        }

        if other.server.is_some() {
            self.server = other.server;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// The `[session]` section, or its defaults.
    pub fn session_or_default(&self) -> SessionSection {
        self.session.clone().unwrap_or_default()
    }

    /// The `[server]` section, or its defaults.
    pub fn server_or_default(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    /// The `[logging]` section, or its defaults.
    pub fn logging_or_default(&self) -> LoggingSection {
        self.logging.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session manager configuration.
///
/// ```toml
/// [session]
/// cookie_name = "satchel_sid"
/// max_age_secs = 1800
/// gc_interval_secs = 60
/// unknown_id_policy = "adopt"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Idle lifetime of a session in seconds. 0 selects the built-in default.
    pub max_age_secs: u64,
    /// Seconds between GC sweeps.
    pub gc_interval_secs: u64,
    /// Handling of cookies naming a session that is not live.
    pub unknown_id_policy: UnknownIdPolicy,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            max_age_secs: 0,
            gc_interval_secs: DEFAULT_GC_INTERVAL.as_secs(),
            unknown_id_policy: UnknownIdPolicy::default(),
        }
    }
}

impl SessionSection {
    /// Convert into a validated [`ManagerConfig`].
    pub fn to_manager_config(&self) -> Result<ManagerConfig> {
        let config = ManagerConfig::new()
            .with_cookie_name(self.cookie_name.clone())
            .with_max_age(Duration::from_secs(self.max_age_secs))
            .with_gc_interval(Duration::from_secs(self.gc_interval_secs))
            .with_unknown_id_policy(self.unknown_id_policy);

        config.validate().map_err(|e| ConfigError::Invalid {
            field: "session".to_string(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable request logging.
    pub request_logging: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            request_logging: true,
        }
    }
}

impl ServerSection {
    /// Parse `bind:port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                field: "server.bind".to_string(),
                reason: format!("'{}': {}", self.bind, e),
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Log file configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Whether to write the rolling JSON log file.
    pub file: bool,
    /// Directory for log files. Defaults to `<config dir>/logs`.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            file: true,
            directory: None,
        }
    }
}
