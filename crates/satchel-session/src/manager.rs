//! Session manager: cookie resolution on top of a storage provider.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use http::HeaderMap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::config::{ManagerConfig, UnknownIdPolicy};
use crate::cookie::{CookieDirective, read_cookie};
use crate::error::{Error, Result};
use crate::gc::{GcHandle, spawn_gc_loop};
use crate::id::{self, SessionId};
use crate::memory::MemoryProvider;
use crate::provider::{ProviderRegistry, SharedProvider};
use crate::session::SharedSession;

/// Outcome of resolving a request to its session.
#[derive(Clone)]
pub struct Resolved {
    /// The session the request is bound to.
    pub session: SharedSession,
    /// Cookie to send back, present only when a session was created.
    pub cookie: Option<CookieDirective>,
}

impl Resolved {
    /// Whether resolution created a new session.
    pub fn is_new(&self) -> bool {
        self.cookie.is_some()
    }
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("session", self.session.id())
            .field("cookie", &self.cookie)
            .finish()
    }
}

/// Binds a storage provider to a cookie name and resolves requests to sessions.
///
/// Resolution runs under a manager-wide lock, so two requests presenting the
/// same unknown cookie can never both create a container for it.
pub struct SessionManager {
    provider: SharedProvider,
    config: ManagerConfig,
    resolve_lock: Mutex<()>,
}

impl SessionManager {
    /// Create a manager over `provider`.
    pub fn new(provider: SharedProvider, config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            provider = provider.name(),
            cookie = %config.cookie_name,
            max_age_secs = config.effective_max_age().as_secs(),
            "Session manager created"
        );
        Ok(Self {
            provider,
            config,
            resolve_lock: Mutex::new(()),
        })
    }

    /// Create a manager over the provider registered as `name`.
    pub fn from_registry(
        registry: &ProviderRegistry,
        name: &str,
        config: ManagerConfig,
    ) -> Result<Self> {
        Self::new(registry.get(name)?, config)
    }

    /// Create a manager over a fresh [`MemoryProvider`].
    pub fn in_memory(config: ManagerConfig) -> Result<Self> {
        Self::new(Arc::new(MemoryProvider::new()), config)
    }

    /// Name of the session cookie.
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Max-age new sessions and their cookies receive.
    pub fn max_age(&self) -> Duration {
        self.config.effective_max_age()
    }

    /// The manager's configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The underlying storage provider.
    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    /// Resolve a request's headers to its session.
    pub fn resolve_session(&self, headers: &HeaderMap) -> Result<Resolved> {
        let presented = read_cookie(headers, &self.config.cookie_name);
        self.resolve_cookie(presented.as_deref())
    }

    /// Resolve an already-extracted (decoded) cookie value to its session.
    ///
    /// `None` or an empty value creates a new session and a cookie for it.
    /// A live identifier returns its session with no cookie. An identifier
    /// that is not live is handled per [`UnknownIdPolicy`].
    pub fn resolve_cookie(&self, presented: Option<&str>) -> Result<Resolved> {
        self.resolve_cookie_at(presented, Utc::now())
    }

    fn resolve_cookie_at(&self, presented: Option<&str>, now: DateTime<Utc>) -> Result<Resolved> {
        let _guard = self.resolve_lock.lock();

        let Some(value) = presented.filter(|v| !v.is_empty()) else {
            return self.create_fresh(now);
        };

        let id = SessionId::new(value);
        if let Some(session) = self.provider.read_session(&id)? {
            trace!(session_id = %id, "Resolved existing session");
            session.touch();
            return Ok(Resolved {
                session,
                cookie: None,
            });
        }

        match self.config.unknown_id_policy {
            UnknownIdPolicy::Adopt if id.is_well_formed() => {
                debug!(session_id = %id, "Re-creating session for unknown identifier");
                self.create(&id, now)
            }
            UnknownIdPolicy::Adopt => {
                warn!(cookie = %self.config.cookie_name, "Rejected malformed session cookie");
                self.create_fresh(now)
            }
            UnknownIdPolicy::Regenerate => {
                debug!("Unknown session identifier, issuing a new one");
                self.create_fresh(now)
            }
        }
    }

    fn create_fresh(&self, now: DateTime<Utc>) -> Result<Resolved> {
        let id = id::generate()?;
        match self.create(&id, now) {
            // 256 random bits colliding means something is badly wrong; try once more.
            Err(Error::AlreadyExists(_)) => {
                warn!("Generated session identifier collided with a live session");
                self.create(&id::generate()?, now)
            }
            other => other,
        }
    }

    fn create(&self, id: &SessionId, now: DateTime<Utc>) -> Result<Resolved> {
        let session = self.provider.init_session(id, self.config.max_age)?;
        let cookie = CookieDirective::issue(&self.config.cookie_name, id, session.max_age(), now);
        Ok(Resolved {
            session,
            cookie: Some(cookie),
        })
    }

    /// Look up a live session without creating one.
    pub fn session(&self, id: &SessionId) -> Result<Option<SharedSession>> {
        self.provider.read_session(id)
    }

    /// Destroy a session (logout). Unknown identifiers are ignored.
    pub fn destroy_session(&self, id: &SessionId) -> Result<()> {
        self.provider.destroy_session(id)
    }

    /// Cookie directive that removes the session cookie from the client.
    pub fn logout_cookie(&self) -> CookieDirective {
        CookieDirective::expire(&self.config.cookie_name)
    }

    /// Run one GC sweep now. Returns the number of sessions evicted.
    pub fn gc(&self) -> usize {
        self.provider.gc()
    }

    /// Start the background GC loop at the configured interval.
    pub fn spawn_gc(self: &Arc<Self>) -> GcHandle {
        spawn_gc_loop(Arc::clone(self))
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use http::HeaderValue;
    use http::header::COOKIE;
    use serde_json::json;

    fn manager() -> SessionManager {
        SessionManager::in_memory(ManagerConfig::default()).unwrap()
    }

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_no_cookie_creates_session() {
        let manager = manager();
        let resolved = manager.resolve_session(&HeaderMap::new()).unwrap();

        let cookie = resolved.cookie.as_ref().unwrap();
        assert_eq!(cookie.name, "satchel_sid");
        assert_eq!(cookie.path, "/");
        assert!(cookie.http_only);
        assert_eq!(cookie.max_age, Duration::from_secs(1800));
        assert_eq!(cookie.value, resolved.session.id().as_str());
        assert!(resolved.session.id().is_well_formed());
        assert_eq!(manager.provider().len(), 1);
    }

    #[test]
    fn test_empty_cookie_creates_session() {
        let manager = manager();
        let resolved = manager.resolve_session(&headers_with("satchel_sid=")).unwrap();
        assert!(resolved.is_new());
        assert!(!resolved.session.id().as_str().is_empty());
    }

    #[test]
    fn test_replay_returns_same_session() {
        let manager = manager();
        let first = manager.resolve_session(&HeaderMap::new()).unwrap();
        first.session.set("cart", json!([1, 2])).unwrap();

        let cookie = first.cookie.unwrap();
        let headers = headers_with(&format!("{}={}", cookie.name, cookie.value));
        let second = manager.resolve_session(&headers).unwrap();

        assert!(second.cookie.is_none());
        assert_eq!(second.session.id(), first.session.id());
        assert_eq!(second.session.get("cart"), Some(json!([1, 2])));
    }

    #[test]
    fn test_configured_max_age_on_cookie() {
        let config = ManagerConfig::new()
            .with_cookie_name("JSESSIONID")
            .with_max_age(Duration::from_secs(120));
        let manager = SessionManager::in_memory(config).unwrap();

        let resolved = manager.resolve_cookie(None).unwrap();
        let cookie = resolved.cookie.unwrap();
        assert_eq!(cookie.name, "JSESSIONID");
        assert_eq!(cookie.max_age, Duration::from_secs(120));
        assert_eq!(resolved.session.max_age(), Duration::from_secs(120));
    }

    #[test]
    fn test_cookie_expires_after_now() {
        let manager = manager();
        let now = Utc::now();
        let resolved = manager.resolve_cookie_at(None, now).unwrap();
        let cookie = resolved.cookie.unwrap();
        assert_eq!(cookie.expires, now + TimeDelta::seconds(1800));
    }

    #[test]
    fn test_unknown_well_formed_id_is_adopted() {
        let manager = manager();
        let presented = id::generate().unwrap();

        let resolved = manager.resolve_cookie(Some(presented.as_str())).unwrap();
        assert_eq!(resolved.session.id(), &presented);
        assert_eq!(resolved.cookie.unwrap().value, presented.as_str());
    }

    #[test]
    fn test_malformed_id_is_replaced() {
        let manager = manager();
        let resolved = manager.resolve_cookie(Some("admin")).unwrap();

        assert_ne!(resolved.session.id().as_str(), "admin");
        assert!(resolved.session.id().is_well_formed());
        assert!(manager.session(&SessionId::new("admin")).unwrap().is_none());
    }

    #[test]
    fn test_regenerate_policy() {
        let config = ManagerConfig::new().with_unknown_id_policy(UnknownIdPolicy::Regenerate);
        let manager = SessionManager::in_memory(config).unwrap();
        let presented = id::generate().unwrap();

        let resolved = manager.resolve_cookie(Some(presented.as_str())).unwrap();
        assert_ne!(resolved.session.id(), &presented);
        assert!(resolved.is_new());
    }

    #[test]
    fn test_destroy_then_resolve_recreates() {
        let manager = manager();
        let first = manager.resolve_cookie(None).unwrap();
        let id = first.session.id().clone();
        first.session.set("user", json!("alice")).unwrap();

        manager.destroy_session(&id).unwrap();
        assert!(manager.session(&id).unwrap().is_none());

        let again = manager.resolve_cookie(Some(id.as_str())).unwrap();
        assert!(again.is_new());
        assert_eq!(again.session.id(), &id);
        assert_eq!(again.session.get("user"), None);
    }

    #[test]
    fn test_logout_cookie() {
        let manager = manager();
        let cookie = manager.logout_cookie();
        assert_eq!(cookie.name, manager.cookie_name());
        assert_eq!(cookie.max_age, Duration::ZERO);
    }

    #[test]
    fn test_from_registry() {
        let registry = ProviderRegistry::new()
            .with_provider("memory", Arc::new(MemoryProvider::new()))
            .unwrap();

        let manager =
            SessionManager::from_registry(&registry, "memory", ManagerConfig::default()).unwrap();
        assert_eq!(manager.provider().name(), "memory");

        let err = SessionManager::from_registry(&registry, "file", ManagerConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownProvider(_)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = SessionManager::in_memory(ManagerConfig::new().with_cookie_name("bad name"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_concurrent_resolution_of_same_unknown_id() {
        let manager = Arc::new(manager());
        let presented = id::generate().unwrap();

        let created: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let manager = Arc::clone(&manager);
                    let presented = presented.clone();
                    scope.spawn(move || {
                        let resolved = manager.resolve_cookie(Some(presented.as_str())).unwrap();
                        usize::from(resolved.is_new())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(created, 1);
        assert_eq!(manager.provider().len(), 1);
    }
}
