use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::User;

/// Authenticated user context extracted from the bearer token.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

/// Bearer-token middleware for the protected routes.
///
/// Three failure shapes, each its own 401 message: no header at all, a
/// header that is not `Bearer <token>`, and a token that fails signature
/// or expiry checks.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if authorization.is_empty() {
        return Err(ApiError::unauthorized("unauthorized token is empty"));
    }

    let token = authorization
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("invalid bearer token"))?;

    let claims = auth::decode_token(token, &state.config.security.jwt_secret)
        .map_err(|_| ApiError::unauthorized("token is invalid or expired"))?;

    tracing::debug!(username = %claims.sub, "authenticated request");
    request.extensions_mut().insert(AuthUser(claims.user));

    Ok(next.run(request).await)
}
