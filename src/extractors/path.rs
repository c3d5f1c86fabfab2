//! Path parameter extractors.

use crate::error::{AppError, FieldError, ValidationErrors};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

/// `:id` segment parsed as a UUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rej| ValidationErrors::single(FieldError::new(&["path", "id"], "missing", rej.body_text())))?;
        let id = Uuid::parse_str(&raw).map_err(|e| {
            ValidationErrors::single(FieldError::new(
                &["path", "id"],
                "uuid_parsing",
                format!("Input should be a valid UUID, {}", e),
            ))
        })?;
        Ok(UserId(id))
    }
}
