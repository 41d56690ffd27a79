//! Lease bookkeeping for idle-time expiration.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Last access time and max-age of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    last_accessed: DateTime<Utc>,
    max_age: Duration,
}

impl Lease {
    /// Start a lease at `now`.
    pub fn new(now: DateTime<Utc>, max_age: Duration) -> Self {
        Self {
            last_accessed: now,
            max_age,
        }
    }

    /// Record an access. The access time never moves backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_accessed {
            self.last_accessed = now;
        }
    }

    /// When the session was last accessed.
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    /// Idle duration after which the session may be reclaimed.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// `last_accessed + max_age`, saturating at the maximum representable time.
    pub fn expires_at(&self) -> DateTime<Utc> {
        TimeDelta::from_std(self.max_age)
            .ok()
            .and_then(|delta| self.last_accessed.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the deadline is strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() < now
    }
}
