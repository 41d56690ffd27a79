//! Liveness check.
//!
//! Sits outside the session middleware: answering it never mints a session
//! or a cookie, so load balancers polling it do not fill the store.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Liveness report.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Crate version serving the request.
    pub version: String,
    /// Storage provider backing the sessions.
    pub provider: String,
    /// Seconds between GC sweeps.
    pub gc_interval_secs: u64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let manager = &state.manager;
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        provider: manager.provider().name().into(),
        gc_interval_secs: manager.config().gc_interval.as_secs(),
    })
}

/// Routes served without a session.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use satchel_session::{ManagerConfig, SessionManager};
    use tower::ServiceExt;

    use super::*;
    use crate::ServerConfig;

    #[tokio::test]
    async fn test_reports_store_without_touching_it() {
        let config = ManagerConfig::new().with_gc_interval(Duration::from_secs(15));
        let manager = Arc::new(SessionManager::in_memory(config).unwrap());
        let app = health_routes().with_state(AppState::new(manager.clone(), ServerConfig::new()));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let report: HealthResponse = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(report.status, "ok");
        assert_eq!(report.provider, "memory");
        assert_eq!(report.gc_interval_secs, 15);
        assert!(manager.provider().is_empty());
    }
}
