//! Session store statistics.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Store statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Name of the storage provider.
    pub provider: String,
    /// Number of live sessions, including the caller's.
    pub live_sessions: usize,
}

/// GET /api/v1/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let provider = state.manager.provider();
    Json(StatsResponse {
        provider: provider.name().to_string(),
        live_sessions: provider.len(),
    })
}
