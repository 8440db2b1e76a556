//! Authenticated user extraction.
//!
//! The user id is taken from the `X-User-ID` header installed by the
//! upstream authentication layer after token verification. It is never
//! accepted from the request body or path: those are untrusted client
//! inputs, while the identity context is not.

use crate::error::AppError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Identity context for an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!(
                    "Missing X-User-ID header (required from auth layer)"
                ))
            })?;

        let span = tracing::Span::current();
        span.record("user_id", user_id);

        Ok(AuthenticatedUser {
            user_id: user_id.to_string(),
        })
    }
}
