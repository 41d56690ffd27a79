//! Application state shared across handlers.

use std::sync::Arc;

use satchel_session::SessionManager;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session manager resolving cookies to sessions.
    pub manager: Arc<SessionManager>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(manager: Arc<SessionManager>, config: ServerConfig) -> Self {
        Self {
            manager,
            config: Arc::new(config),
        }
    }
}
