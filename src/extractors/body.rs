//! JSON body extractor that applies field rules before deserializing.

use crate::error::{AppError, FieldError, ValidationErrors};
use crate::service::{RequestValidator, Validate};
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rej| ValidationErrors::single(FieldError::new(&["body"], "json_invalid", rej.body_text())))?;
        RequestValidator::validate_body(&value, T::RULES)?;
        let parsed = serde_json::from_value(value)
            .map_err(|e| ValidationErrors::single(FieldError::new(&["body"], "value_error", e.to_string())))?;
        Ok(ValidatedJson(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UserCreate, UserUpdate};
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;

    fn json_request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/users")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidatedJson(update) = ValidatedJson::<UserUpdate>::from_request(json_request(r#"{"version": 2, "title": "CTO"}"#), &())
            .await
            .unwrap();
        assert_eq!(update.version, 2);
        assert_eq!(update.title.as_deref(), Some("CTO"));
        assert!(update.name.is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let err = ValidatedJson::<UserCreate>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errs) => assert_eq!(errs.0[0].kind, "json_invalid"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rule_violations_are_collected() {
        let err = ValidatedJson::<UserUpdate>::from_request(json_request(r#"{"version": 0, "role": "admin"}"#), &())
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errs) => {
                let kinds: Vec<&str> = errs.0.iter().map(|e| e.kind.as_str()).collect();
                assert_eq!(kinds, vec!["extra_forbidden", "greater_than_equal"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
