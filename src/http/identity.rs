//! Acting-user extraction.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user's identifier in [`USER_ID_HEADER`].

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::ApiError;
use crate::booking::domain::UserId;

/// Header carrying the authenticated user identifier.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identifier of the user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("missing {USER_ID_HEADER} header")))?
            .to_str()
            .map_err(|_| ApiError::Unauthenticated(format!("malformed {USER_ID_HEADER} header")))?;
        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| ApiError::Unauthenticated(format!("malformed {USER_ID_HEADER} header")))?;
        Ok(Self(UserId::from_uuid(id)))
    }
}
