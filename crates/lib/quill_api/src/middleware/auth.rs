//! Authentication middleware: Bearer token extraction and JWT verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use quill_core::models::auth::TokenClaims;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Authorization scheme prefix, matched case-sensitively.
const BEARER_PREFIX: &str = "Bearer ";

/// Identity of the caller, inserted into request extensions by
/// [`require_auth`] and read by handlers through `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
}

impl From<TokenClaims> for AuthenticatedUser {
    fn from(claims: TokenClaims) -> Self {
        AuthenticatedUser {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// Take the credential out of an `Authorization` header value.
///
/// A value without the `Bearer ` prefix is used as the raw token.
pub fn bearer_credential(header: &str) -> &str {
    header.strip_prefix(BEARER_PREFIX).unwrap_or(header)
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the JWT,
/// and injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            debug!("auth: missing authorization header");
            AppError::Unauthorized("Authorization header required".into())
        })?;

    let token = bearer_credential(header);

    let claims = state.tokens.validate(token, Utc::now()).map_err(|e| {
        debug!(error = %e, "auth: token rejected");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(request).await)
}
