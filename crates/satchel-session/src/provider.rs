//! Storage provider interface and the provider registry.
//!
//! A [`SessionProvider`] owns every live session for one backend. The
//! [`ProviderRegistry`] lets an application name several backends and hand the
//! chosen one to a [`SessionManager`](crate::SessionManager) at construction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::id::SessionId;
use crate::session::SharedSession;

/// Shared handle to a storage provider.
pub type SharedProvider = Arc<dyn SessionProvider>;

/// Trait for session storage backends.
///
/// Implementations must be safe under concurrent calls. Structural changes
/// (insert, delete, sweep) are serialized by the backend.
pub trait SessionProvider: Send + Sync {
    /// Short backend name used in logs and stats.
    fn name(&self) -> &str;

    /// Create a session under `id` and store it.
    ///
    /// A zero `max_age` selects the container default. Fails with
    /// [`Error::AlreadyExists`] if `id` is already live.
    fn init_session(&self, id: &SessionId, max_age: Duration) -> Result<SharedSession>;

    /// Look up a live session by identifier.
    fn read_session(&self, id: &SessionId) -> Result<Option<SharedSession>>;

    /// Remove a session. Unknown identifiers are ignored.
    fn destroy_session(&self, id: &SessionId) -> Result<()>;

    /// Evict every session whose deadline is strictly before `now`.
    ///
    /// Returns the number of sessions evicted.
    fn gc_at(&self, now: DateTime<Utc>) -> usize;

    /// Evict every session that has expired as of the current time.
    fn gc(&self) -> usize {
        self.gc_at(Utc::now())
    }

    /// Number of sessions currently stored.
    fn len(&self) -> usize;

    /// Whether the store holds no sessions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Named collection of storage providers.
///
/// Constructed by the application and passed to the manager explicitly.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, SharedProvider>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `name`.
    ///
    /// Registering the same name twice is an error.
    pub fn register(&mut self, name: impl Into<String>, provider: SharedProvider) -> Result<()> {
        let name = name.into();
        if self.providers.contains_key(&name) {
            return Err(Error::DuplicateProvider(name));
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_provider(
        mut self,
        name: impl Into<String>,
        provider: SharedProvider,
    ) -> Result<Self> {
        self.register(name, provider)?;
        Ok(self)
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Result<SharedProvider> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
