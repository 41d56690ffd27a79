//! In-memory storage provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::config::DEFAULT_MAX_AGE;
use crate::error::{Error, Result};
use crate::id::SessionId;
use crate::provider::SessionProvider;
use crate::session::{Session, SharedSession};
use crate::ttl::Lease;

/// Name the memory backend reports.
pub const MEMORY_PROVIDER_NAME: &str = "memory";

/// Data and lease of one session, guarded together.
#[derive(Debug)]
struct SessionState {
    values: HashMap<String, Value>,
    lease: Lease,
}

/// Session container held by [`MemoryProvider`].
#[derive(Debug)]
pub struct MemorySession {
    id: SessionId,
    state: Mutex<SessionState>,
}

impl MemorySession {
    /// Create an empty session whose lease starts at `now`.
    ///
    /// A zero `max_age` selects [`DEFAULT_MAX_AGE`].
    pub fn new(id: SessionId, now: DateTime<Utc>, max_age: Duration) -> Self {
        let max_age = if max_age.is_zero() {
            DEFAULT_MAX_AGE
        } else {
            max_age
        };
        Self {
            id,
            state: Mutex::new(SessionState {
                values: HashMap::new(),
                lease: Lease::new(now, max_age),
            }),
        }
    }
}

impl Session for MemorySession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut state = self.state.lock();
        state.values.insert(key.to_string(), value);
        state.lease.touch(Utc::now());
        Ok(())
    }

    fn get(&self, key: &str) -> Option<Value> {
        let mut state = self.state.lock();
        state.lease.touch(Utc::now());
        state.values.get(key).cloned()
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.values.remove(key);
        state.lease.touch(Utc::now());
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.state.lock().values.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.state.lock().values.len()
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.values.clear();
        state.lease.touch(Utc::now());
        Ok(())
    }

    fn touch(&self) {
        self.state.lock().lease.touch(Utc::now());
    }

    fn last_accessed(&self) -> DateTime<Utc> {
        self.state.lock().lease.last_accessed()
    }

    fn max_age(&self) -> Duration {
        self.state.lock().lease.max_age()
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.state.lock().lease.expires_at()
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.state.lock().lease.is_expired_at(now)
    }
}

/// Storage provider keeping every session in a process-local map.
///
/// One lock guards the map's structure; each session's data has its own lock,
/// so payload mutation never contends with inserts, deletes, or sweeps once a
/// handle is held.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    sessions: RwLock<HashMap<SessionId, Arc<MemorySession>>>,
}

impl MemoryProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// [`init_session`](SessionProvider::init_session) with an explicit creation time.
    pub fn init_session_at(
        &self,
        id: &SessionId,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<SharedSession> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }

        let session = Arc::new(MemorySession::new(id.clone(), now, max_age));
        sessions.insert(id.clone(), Arc::clone(&session));
        debug!(
            session_id = %id,
            max_age_secs = session.max_age().as_secs(),
            live = sessions.len(),
            "Session created"
        );
        Ok(session as SharedSession)
    }

    /// Identifiers of every stored session, in no particular order.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().keys().cloned().collect()
    }
}

impl SessionProvider for MemoryProvider {
    fn name(&self) -> &str {
        MEMORY_PROVIDER_NAME
    }

    fn init_session(&self, id: &SessionId, max_age: Duration) -> Result<SharedSession> {
        self.init_session_at(id, max_age, Utc::now())
    }

    fn read_session(&self, id: &SessionId) -> Result<Option<SharedSession>> {
        let found = self.sessions.read().get(id).cloned();
        trace!(session_id = %id, found = found.is_some(), "Session lookup");
        Ok(found.map(|s| s as SharedSession))
    }

    fn destroy_session(&self, id: &SessionId) -> Result<()> {
        if self.sessions.write().remove(id).is_some() {
            debug!(session_id = %id, "Session destroyed");
        }
        Ok(())
    }

    fn gc_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|id, session| {
            let expired = session.is_expired_at(now);
            if expired {
                debug!(session_id = %id, "Evicting expired session");
            }
            !expired
        });
        let evicted = before - sessions.len();

        if evicted > 0 {
            info!(evicted, live = sessions.len(), "Expired sessions swept");
        }

        evicted
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }
}
