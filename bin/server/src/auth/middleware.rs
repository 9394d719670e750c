//! Bearer-token middleware and the verified caller extractor.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use savannah_platform_access::{VerifiedClaims, bearer_token};
use std::sync::Arc;

use super::AppState;
use crate::error::ApiError;

/// Rejects requests without a valid `Authorization: Bearer <id_token>`.
///
/// On success the token's claims are stored in the request extensions for
/// [`VerifiedCaller`]. Nothing is persisted.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default());
    let token = bearer_token(header)?;

    let claims = state.provider.verify_id_token(token, None)?;
    tracing::debug!(
        subject = %claims.subject,
        expires_at = %claims.expires_at,
        "Bearer token accepted"
    );

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extractor for the caller verified by [`require_bearer`].
///
/// Rejects with 401 when the route is not behind the bearer middleware.
pub struct VerifiedCaller(pub VerifiedClaims);

impl<S> FromRequestParts<S> for VerifiedCaller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedClaims>()
            .cloned()
            .map(VerifiedCaller)
            .ok_or_else(|| ApiError::Authentication("no verified claims on request".to_string()))
    }
}
