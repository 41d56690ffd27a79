//! Configuration for the session manager.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default name of the cookie carrying the session identifier.
pub const DEFAULT_COOKIE_NAME: &str = "satchel_sid";

/// Lifetime applied to a container when no positive max-age is requested (30 minutes).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(1800);

/// Default interval between garbage-collection sweeps.
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(60);

/// What to do when a request presents a cookie whose identifier is not live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownIdPolicy {
    /// Re-create the session under the presented identifier, provided it is
    /// shaped like one this store would have generated. Malformed values are
    /// replaced with a fresh identifier.
    #[default]
    Adopt,

    /// Always replace an unknown identifier with a freshly generated one.
    Regenerate,
}

/// Configuration for a [`SessionManager`](crate::SessionManager).
///
/// Fixed at manager construction.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Name of the cookie carrying the session identifier.
    pub cookie_name: String,

    /// Max-age applied to new sessions and their cookies.
    /// `Duration::ZERO` defers to the container default ([`DEFAULT_MAX_AGE`]).
    pub max_age: Duration,

    /// Interval between background GC sweeps.
    pub gc_interval: Duration,

    /// Handling of cookies naming a session that is not live.
    pub unknown_id_policy: UnknownIdPolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            max_age: Duration::ZERO,
            gc_interval: DEFAULT_GC_INTERVAL,
            unknown_id_policy: UnknownIdPolicy::default(),
        }
    }
}

impl ManagerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the session max-age.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set the GC sweep interval.
    pub fn with_gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = interval;
        self
    }

    /// Set the unknown-identifier policy.
    pub fn with_unknown_id_policy(mut self, policy: UnknownIdPolicy) -> Self {
        self.unknown_id_policy = policy;
        self
    }

    /// Max-age that sessions and cookies actually receive.
    pub fn effective_max_age(&self) -> Duration {
        if self.max_age.is_zero() {
            DEFAULT_MAX_AGE
        } else {
            self.max_age
        }
    }

    /// Check that the configuration can drive a manager.
    pub fn validate(&self) -> Result<()> {
        if self.cookie_name.is_empty() {
            return Err(Error::InvalidConfig("cookie name must not be empty".into()));
        }
        // RFC 6265 cookie-name is a token: no separators, controls or whitespace.
        if let Some(c) = self
            .cookie_name
            .chars()
            .find(|c| !c.is_ascii_graphic() || "()<>@,;:\\\"/[]?={}".contains(*c))
        {
            return Err(Error::InvalidConfig(format!(
                "cookie name '{}' contains invalid character {:?}",
                self.cookie_name, c
            )));
        }
        if self.gc_interval.is_zero() {
            return Err(Error::InvalidConfig("gc interval must be positive".into()));
        }
        Ok(())
    }
}
