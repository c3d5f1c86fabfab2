//! Typed errors and HTTP mapping.

use crate::db::LifecycleState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Startup configuration problems. Fatal: the process must not serve traffic.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' (supported: {supported})")]
    InvalidValue {
        var: &'static str,
        value: String,
        supported: &'static str,
    },
    #[error("database provider '{provider}' is not implemented: set POSTGRES_PROVIDER=local or add a {provider} connector")]
    ProviderNotImplemented { provider: &'static str },
    #[error("invalid DATABASE_URL: {0}")]
    DatabaseUrl(String),
    #[error("invalid allowed origin: '{0}'")]
    InvalidOrigin(String),
    #[error("logging setup: {0}")]
    Logging(String),
}

/// Failure to open the unpooled migration connection.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connect timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Misuse of the database lifecycle (ordering errors).
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("database not initialized: call Database::init during application startup")]
    NotInitialized,
    #[error("cannot {action} database from state {from}")]
    InvalidTransition {
        action: &'static str,
        from: LifecycleState,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("update on table '{table}' expected to match 1 row (id {id}, version {expected_version}); 0 were matched")]
    StaleData {
        table: &'static str,
        id: Uuid,
        expected_version: i32,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// One failed field check. `loc` is the path to the offending input, e.g. `["query", "limit"]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: &[&str], kind: &str, msg: impl Into<String>) -> Self {
        FieldError {
            loc: loc.iter().map(|s| (*s).to_string()).collect(),
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(err: FieldError) -> Self {
        ValidationErrors(vec![err])
    }

    pub fn push(&mut self, err: FieldError) {
        self.0.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was collected.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.loc.join("."), e.msg))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Per-request failure. Rendered into the error envelope by [`render_error`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{kind}: {message}")]
    Internal { kind: String, message: String },
}

impl AppError {
    pub fn internal(kind: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Internal {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Error category as it appears in the envelope's `type` field.
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Db(_) => "database_error",
            AppError::Internal { .. } => "internal_error",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(DbError::Sqlx(e))
    }
}

impl From<LifecycleError> for AppError {
    fn from(e: LifecycleError) -> Self {
        AppError::internal("LifecycleError", e.to_string())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// Null in production.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Map an error to status and envelope. Details are withheld in production.
pub fn render_error(err: &AppError, is_production: bool) -> (StatusCode, ErrorBody) {
    let (status, message, details) = match err {
        AppError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid request data".to_string(),
            serde_json::json!({ "validation_errors": errors.0 }),
        ),
        AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what), serde_json::Value::Null),
        AppError::Db(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "A database error occurred".to_string(),
            serde_json::json!({ "database_error": e.to_string() }),
        ),
        AppError::Internal { kind, message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred".to_string(),
            serde_json::json!({
                "exception_type": kind,
                "exception_message": message,
            }),
        ),
    };
    let details = if is_production || details.is_null() {
        None
    } else {
        Some(details)
    };
    (
        status,
        ErrorBody {
            error: ErrorDetail {
                kind: err.error_type().to_string(),
                message,
                details,
            },
        },
    )
}

/// Carries the original error on the response so the error middleware can log it
/// and re-render it for the configured environment.
#[derive(Clone, Debug)]
pub struct RaisedError(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Without the middleware nothing knows the environment; render as production.
        let (status, body) = render_error(&self, true);
        let mut res = (status, Json(body)).into_response();
        res.extensions_mut().insert(RaisedError(Arc::new(self)));
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation() -> AppError {
        AppError::Validation(ValidationErrors::single(FieldError::new(
            &["query", "limit"],
            "less_than_equal",
            "Input should be less than or equal to 100",
        )))
    }

    #[test]
    fn validation_error_has_details_outside_production() {
        let (status, body) = render_error(&validation(), false);
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["error"]["type"], "validation_error");
        assert_eq!(v["error"]["message"], "Invalid request data");
        assert_eq!(v["error"]["details"]["validation_errors"][0]["loc"][1], "limit");
        assert_eq!(v["error"]["details"]["validation_errors"][0]["type"], "less_than_equal");
    }

    #[test]
    fn production_withholds_details() {
        let errors = [
            validation(),
            AppError::Db(DbError::Sqlx(sqlx::Error::PoolTimedOut)),
            AppError::internal("Panic", "boom"),
        ];
        for err in &errors {
            let (_, body) = render_error(err, true);
            let v = serde_json::to_value(&body).unwrap();
            assert!(v["error"].get("details").is_some(), "details key must be present");
            assert!(v["error"]["details"].is_null());
        }
    }

    #[test]
    fn database_error_maps_to_500() {
        let err = AppError::Db(DbError::StaleData {
            table: "users",
            id: Uuid::nil(),
            expected_version: 3,
        });
        let (status, body) = render_error(&err, false);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.kind, "database_error");
        let detail = body.error.details.unwrap();
        assert!(detail["database_error"].as_str().unwrap().contains("version 3"));
    }

    #[test]
    fn internal_error_reports_kind_and_message() {
        let err: AppError = LifecycleError::NotInitialized.into();
        let (status, body) = render_error(&err, false);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.kind, "internal_error");
        let detail = body.error.details.unwrap();
        assert_eq!(detail["exception_type"], "LifecycleError");
        assert!(detail["exception_message"].as_str().unwrap().contains("not initialized"));
    }

    #[test]
    fn into_response_defaults_to_production_rendering() {
        let res = validation().into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res.extensions().get::<RaisedError>().is_some());
    }
}
