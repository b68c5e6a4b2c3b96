//! Bearer token gate: header extraction → verification → VerifiedIdentity in extensions.
//!
//! - `Authorization` missing, not UTF-8, or not starting with `"Bearer "` → 401
//!   without calling the verifier.
//! - Verifier refuses the token → 403 carrying its message. The wrapped route
//!   never runs.
//! - Otherwise the identity is attached to the request and the route produces
//!   the response; the gate writes nothing itself.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Put the gate in front of every route of `router`.
///
/// `route_layer` so that unmatched paths still answer 404 instead of 401.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, authorize))
}

/// Token part of `Authorization: Bearer <token>`. The scheme is case sensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
}

async fn authorize(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        tracing::warn!(path = %req.uri().path(), "missing or malformed bearer token");
        return Err(AppError::AuthMissing);
    };

    let identity = match state.auth.verify_token(&token).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(
                path = %req.uri().path(),
                error = %err,
                "access token verification failed"
            );
            return Err(AppError::AuthRejected {
                message: err.to_string(),
            });
        }
    };

    tracing::debug!(identity = %identity.as_value(), "bearer token verified");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
