//! Authentication middleware
//!
//! Extracts and validates JWT tokens from requests.

use crate::auth::decode_token;
use crate::error::AppError;
use crate::state::SharedState;
use crate::workflow::Actor;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Resolve the bearer token into an `Actor` for handlers to use
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))?;

    let claims = decode_token(&state.settings.auth.jwt_secret, token)?;
    let actor = Actor::new(claims.sub, claims.name, claims.role.capabilities());
    debug!("Authenticated {} ({}) as {}", actor.name, actor.id, claims.role);

    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}
