use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use serde_json::Value;

use crate::error::ApiError;

/// Header naming the user on whose behalf a write happens
pub const USER_HEADER: &str = "x-user-id";

/// The caller, as far as auditing is concerned.
///
/// There is no authentication layer; the id only fills `userId` on insert
/// and `voidedBy` on soft-delete when the body does not say otherwise.
#[derive(Clone, Debug, Default)]
pub struct Actor {
    pub user_id: Option<i64>,
}

impl Actor {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let Some(raw) = headers.get(USER_HEADER) else {
            return Ok(Actor::default());
        };
        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .ok_or_else(|| ApiError::bad_request(format!("Header {} must be an integer user id", USER_HEADER)))?;
        Ok(Actor { user_id: Some(user_id) })
    }

    pub fn id_value(&self) -> Option<Value> {
        self.user_id.map(Value::from)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Actor::from_headers(&parts.headers)
    }
}
