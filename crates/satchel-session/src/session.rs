//! The per-session data container interface.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::id::SessionId;

/// Shared handle to a live session container.
pub type SharedSession = Arc<dyn Session>;

/// A keyed bag of values scoped to one session identifier.
///
/// Implementations serialize operations on a single container; operations on
/// different containers must not block one another. Every data operation
/// counts as an access and extends the session's lease.
pub trait Session: Send + Sync {
    /// The identifier this container is stored under.
    fn id(&self) -> &SessionId;

    /// Insert or replace the value under `key`.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Look up the value under `key`, `None` if unset.
    fn get(&self, key: &str) -> Option<Value>;

    /// Remove the value under `key`. Removing an unset key is a no-op.
    fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently set, in no particular order.
    fn keys(&self) -> Vec<String>;

    /// Number of keys set.
    fn len(&self) -> usize;

    /// Whether no keys are set.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every value, keeping the session itself alive.
    fn clear(&self) -> Result<()>;

    /// Record an access without touching the data.
    fn touch(&self);

    /// Time of the most recent access.
    fn last_accessed(&self) -> DateTime<Utc>;

    /// Idle duration after which the session may be reclaimed.
    fn max_age(&self) -> Duration;

    /// `last_accessed + max_age`.
    fn expires_at(&self) -> DateTime<Utc>;

    /// Whether the session's deadline is strictly before `now`.
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() < now
    }
}
