use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::Error;

/// The acting user, as established by the fronting auth layer.
///
/// Authentication itself is an external collaborator; it injects the
/// authenticated user's id as the `X-User-Id` header on every request it
/// lets through.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok())
            .map(AuthUser)
            .ok_or(Error::Unauthorized)
    }
}
