//! Who is making the request.
//!
//! Authentication happens in front of this service. The gateway forwards the
//! authenticated user's id in the `x-user-id` header and omits it for
//! anonymous callers.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use survey_intake::UserId;

use crate::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller, if authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer(pub Option<UserId>);

impl Viewer {
    /// The caller's id, or 401 for anonymous callers.
    pub fn require(self) -> Result<UserId, ApiError> {
        self.0.ok_or(ApiError::Unauthenticated)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Self(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|value| value.parse().ok())
            .map(|id| Self(Some(id)))
            .ok_or(ApiError::InvalidIdentity)
    }
}
