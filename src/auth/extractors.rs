use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::{jwt::JwtKeys, repo::User};
use crate::error::ApiError;
use crate::state::AppState;

/// Session resolver: extracts the bearer token, verifies it, then resolves
/// the embedded subject to a live user row. A structurally valid token
/// whose subject has since been deleted is rejected the same as a bad one.
pub struct CurrentUser(pub User);

/// Pulls the token out of an `Authorization` header value. The scheme is
/// case-insensitive per RFC 7235.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = bearer_token(auth_header).ok_or(ApiError::Unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            ApiError::Unauthorized
        })?;

        let user = User::find_by_username(&state.db, &claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(subject = %claims.sub, "token subject no longer exists");
                ApiError::Unauthorized
            })?;

        Ok(CurrentUser(user))
    }
}
