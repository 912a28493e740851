use async_trait::async_trait;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequestParts, Path, Query,
    },
    http::request::Parts,
    Json,
};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

/// `:id` path segment parsed as a user id. A malformed id is a validation error.
pub struct UserId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;

        let id = Uuid::parse_str(&raw).map_err(|_| {
            warn!(id = %raw, "malformed user id");
            ApiError::validation(format!("Invalid user id: {raw}"))
        })?;
        Ok(UserId(id))
    }
}

/// Unwraps a JSON body, turning axum's rejection into a validation error.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(e) => {
            warn!(error = %e.body_text(), "unable to decode JSON");
            Err(ApiError::validation("Invalid request payload"))
        }
    }
}

/// Unwraps a query string, turning axum's rejection into a validation error.
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(e) => {
            warn!(error = %e.body_text(), "unable to decode query string");
            Err(ApiError::validation(e.body_text()))
        }
    }
}
