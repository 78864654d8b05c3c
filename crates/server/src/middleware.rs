use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Identity of the authenticated dashboard user.
///
/// Session handling lives in the fronting identity layer (Clerk in the
/// hosted deployment); by the time a request reaches this service the
/// gateway has validated the session and injected the subject id. Requests
/// without it are rejected outright.
pub struct AuthUser(pub String);

pub const USER_ID_HEADER: &str = "x-user-id";

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| AuthUser(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}
