//! Session middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware that requires a signed-in user.
///
/// Runs before any extractor of the wrapped handler, so an anonymous request is
/// answered with 401 even when its body is also invalid.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match state.sessions.resolve(request.headers()) {
        Some(user) => {
            tracing::debug!(path = %path, user_id = %user.id, "require_session: authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            tracing::warn!(path = %path, "require_session: no valid session (header or cookie)");
            ApiError::Unauthorized.into_response()
        }
    }
}
