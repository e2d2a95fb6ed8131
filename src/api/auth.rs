//! Caller identity
//!
//! Authentication happens upstream; the gateway forwards the verified user id
//! and role as headers. Handlers that take an [`Actor`] reject requests
//! without a usable identity with 401.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::domain::value_objects::{Actor, Role};
use crate::EcommerceError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = EcommerceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(raw_id) = header(parts, USER_ID_HEADER) else {
            return Err(EcommerceError::Unauthorized("Not authorized, no user identity".to_string()));
        };
        let id = Uuid::parse_str(raw_id).map_err(|_| {
            tracing::warn!(uri = %parts.uri, "malformed user id header");
            EcommerceError::Unauthorized("Not authorized, invalid user identity".to_string())
        })?;
        let role = match header(parts, USER_ROLE_HEADER) {
            None => Role::Customer,
            Some(raw) => Role::parse(raw)
                .ok_or_else(|| EcommerceError::Unauthorized(format!("Not authorized, unknown role {raw}")))?,
        };
        Ok(Actor::new(id, role))
    }
}
