//! Session resolution middleware.
//!
//! Every request under the API router is bound to a session before it reaches
//! a handler. The resolved session travels as a [`CurrentSession`] request
//! extension; a newly issued cookie is appended to the response.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use satchel_session::{CookieDirective, SessionId, SharedSession};
use tracing::debug;

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// The session bound to the current request.
#[derive(Clone)]
pub struct CurrentSession(pub SharedSession);

/// Response marker set by handlers that ended the session themselves.
///
/// Suppresses the middleware's own `Set-Cookie` so the expiring cookie wins.
#[derive(Debug, Clone, Copy)]
pub struct SessionEnded;

/// What the session middleware did for one request, attached to the response.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    /// The session the request was bound to.
    pub id: SessionId,
    /// Whether a `Set-Cookie` for a new session was sent.
    pub cookie_issued: bool,
    /// Whether the handler ended the session.
    pub ended: bool,
}

/// Convert a cookie directive into a `Set-Cookie` header value.
pub fn set_cookie_value(cookie: &CookieDirective) -> Result<HeaderValue> {
    HeaderValue::from_str(&cookie.to_header_value())
        .map_err(|e| ServerError::Internal(format!("invalid Set-Cookie header: {}", e)))
}

/// Resolve the request's session and attach any newly issued cookie.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let resolved = state.manager.resolve_session(request.headers())?;
    if resolved.is_new() {
        debug!(session_id = %resolved.session.id(), "Issued session cookie");
    }

    let id = resolved.session.id().clone();
    request
        .extensions_mut()
        .insert(CurrentSession(resolved.session));

    let mut response = next.run(request).await;
    let ended = response.extensions().get::<SessionEnded>().is_some();

    let mut cookie_issued = false;
    if let Some(cookie) = resolved.cookie
        && !ended
    {
        response
            .headers_mut()
            .append(SET_COOKIE, set_cookie_value(&cookie)?);
        cookie_issued = true;
    }

    response.extensions_mut().insert(SessionOutcome {
        id,
        cookie_issued,
        ended,
    });

    Ok(response)
}
