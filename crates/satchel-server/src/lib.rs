//! HTTP API serving cookie-backed sessions for Satchel.
//!
//! This crate is the transport around [`satchel_session`]: it resolves every
//! API request to a session through the session middleware, exposes the
//! session's key/value bag as REST endpoints, and runs the GC loop for the
//! lifetime of the server.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use satchel_server::{Server, ServerConfig};
//! use satchel_session::{ManagerConfig, SessionManager};
//!
//! let manager = Arc::new(SessionManager::in_memory(ManagerConfig::default())?);
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8080".parse()?);
//!
//! Server::new(manager, config).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use logging::access_log_middleware;
pub use session::{CurrentSession, SessionEnded, SessionOutcome, session_middleware};
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use satchel_session::SessionManager;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The Satchel HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server around a session manager.
    pub fn new(manager: Arc<SessionManager>, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(manager, config),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            // Health routes (never create sessions)
            .merge(routes::health_routes())
            .nest("/api/v1", self.api_routes())
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::access_log_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// API routes (v1). All of them are bound to the caller's session.
    fn api_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            .route("/session", get(routes::get_session_handler))
            .route(
                "/session/values/{key}",
                get(routes::get_value_handler)
                    .put(routes::put_value_handler)
                    .delete(routes::delete_value_handler),
            )
            .route("/session/logout", post(routes::logout_handler))
            .route("/stats", get(routes::stats_handler))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                session::session_middleware,
            ))
    }

    /// Run the server on the configured address until ctrl-c.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address until ctrl-c.
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        self.run_with_shutdown(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// The GC loop runs for exactly as long as the server does.
    pub async fn run_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let local = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;

        let gc = self.state.manager.spawn_gc();
        info!(
            addr = %local,
            cookie = self.state.manager.cookie_name(),
            "Starting server"
        );

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)));

        gc.shutdown().await;
        info!("Server stopped");

        served
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }

    /// The session manager behind this server.
    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.state.manager
    }
}
