//! Access log middleware.
//!
//! Emits one event per request. Requests that went through the session
//! middleware also carry the session they were bound to and whether a cookie
//! was issued or cleared, read from the response's [`SessionOutcome`].

use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use crate::session::SessionOutcome;
use crate::state::AppState;

/// Log one access line per request.
pub async fn access_log_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let status = response.status().as_u16();
    let outcome = response.extensions().get::<SessionOutcome>();
    let session_id = outcome.map(|o| o.id.as_str()).unwrap_or("-");
    let cookie_issued = outcome.is_some_and(|o| o.cookie_issued);
    let session_ended = outcome.is_some_and(|o| o.ended);

    if response.status().is_server_error() {
        error!(%method, path, status, elapsed_ms, session_id, "Request failed");
    } else {
        info!(
            %method,
            path,
            status,
            elapsed_ms,
            session_id,
            cookie_issued,
            session_ended,
            "Request served"
        );
    }

    response
}
