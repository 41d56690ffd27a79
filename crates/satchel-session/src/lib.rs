//! Cookie-addressed session store with TTL sweeping.
//!
//! This crate provides the server side of cookie sessions:
//! - Cryptographically random, URL-safe session identifiers
//! - Per-session key/value containers with an idle-time lease
//! - A pluggable storage provider interface with an in-memory backend
//! - A manager that resolves request cookies to sessions and issues new ones
//! - A cancellable background loop that sweeps expired sessions
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use satchel_session::{ManagerConfig, SessionManager};
//!
//! let manager = Arc::new(SessionManager::in_memory(ManagerConfig::default())?);
//! let gc = manager.spawn_gc();
//!
//! let resolved = manager.resolve_session(request.headers())?;
//! resolved.session.set("user", serde_json::json!("alice"))?;
//! if let Some(cookie) = resolved.cookie {
//!     response.headers_mut().append(SET_COOKIE, cookie.to_header_value().parse()?);
//! }
//!
//! gc.shutdown().await;
//! ```

mod config;
mod cookie;
mod error;
mod gc;
mod id;
mod manager;
mod memory;
mod provider;
mod session;
mod ttl;

pub use config::{
    DEFAULT_COOKIE_NAME, DEFAULT_GC_INTERVAL, DEFAULT_MAX_AGE, ManagerConfig, UnknownIdPolicy,
};
pub use cookie::{CookieDirective, read_cookie};
pub use error::{Error, Result};
pub use gc::GcHandle;
pub use id::{ID_ENTROPY_BYTES, SessionId, generate as generate_id, generate_from};
pub use manager::{Resolved, SessionManager};
pub use memory::{MEMORY_PROVIDER_NAME, MemoryProvider, MemorySession};
pub use provider::{ProviderRegistry, SessionProvider, SharedProvider};
pub use session::{Session, SharedSession};
pub use ttl::Lease;
