//! Session data endpoints.
//!
//! Every handler here runs behind the session middleware and operates on the
//! caller's own session.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ServerError};
use crate::session::{CurrentSession, SessionEnded, set_cookie_value};
use crate::state::AppState;

/// Longest key, in bytes, that PUT accepts.
pub const MAX_KEY_LEN: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Summary of the caller's session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session ID.
    pub id: String,
    /// Keys currently set, sorted.
    pub keys: Vec<String>,
    /// Last access time.
    pub last_accessed: DateTime<Utc>,
    /// When the session becomes eligible for eviction if left idle.
    pub expires_at: DateTime<Utc>,
}

/// A single stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueResponse {
    /// The key looked up.
    pub key: String,
    /// The stored value.
    pub value: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/session
pub async fn get_session_handler(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Json<SessionInfo> {
    let mut keys = session.keys();
    keys.sort();

    Json(SessionInfo {
        id: session.id().to_string(),
        keys,
        last_accessed: session.last_accessed(),
        expires_at: session.expires_at(),
    })
}

/// GET /api/v1/session/values/{key}
pub async fn get_value_handler(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(key): Path<String>,
) -> Result<Json<ValueResponse>> {
    let value = session
        .get(&key)
        .ok_or_else(|| ServerError::NotFound(format!("key '{}'", key)))?;
    Ok(Json(ValueResponse { key, value }))
}

/// PUT /api/v1/session/values/{key}
pub async fn put_value_handler(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(key): Path<String>,
    Json(value): Json<Value>,
) -> Result<StatusCode> {
    validate_key(&key)?;
    session.set(&key, value)?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(ServerError::BadRequest("key must not be blank".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(ServerError::BadRequest(format!(
            "key is {} bytes, limit is {}",
            key.len(),
            MAX_KEY_LEN
        )));
    }
    Ok(())
}

/// DELETE /api/v1/session/values/{key}
///
/// Deleting an unset key succeeds.
pub async fn delete_value_handler(
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    session.remove(&key)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/session/logout
///
/// Destroys the session and tells the client to drop its cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<impl IntoResponse> {
    state.manager.destroy_session(session.id())?;
    tracing::info!(session_id = %session.id(), "Session logged out");

    let cookie = set_cookie_value(&state.manager.logout_cookie())?;
    Ok((
        StatusCode::NO_CONTENT,
        Extension(SessionEnded),
        [(SET_COOKIE, cookie)],
    ))
}
