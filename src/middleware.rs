//! Error translation, panic capture and CORS.

use crate::error::{render_error, AppError, ConfigError, RaisedError};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::any::Any;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Log any `AppError` a handler or extractor raised, then render it for the configured environment.
pub async fn translate_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let mut res = next.run(req).await;
    let Some(RaisedError(err)) = res.extensions_mut().remove::<RaisedError>() else {
        return res;
    };
    match err.as_ref() {
        AppError::Validation(errors) => {
            tracing::warn!(%method, %path, errors = %errors, "request validation failed")
        }
        AppError::NotFound(what) => tracing::info!(%method, %path, resource = %what, "not found"),
        AppError::Db(e) => tracing::error!(%method, %path, error = %e, "database error"),
        AppError::Internal { .. } => tracing::error!(%method, %path, error = ?err, "unhandled error"),
    }
    let (status, body) = render_error(&err, state.settings.is_production());
    (status, Json(body)).into_response()
}

/// Turn a handler panic into an `internal_error` response.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::internal("Panic", message).into_response()
}

/// Credentials allowed; methods and headers mirrored. `*` mirrors the request origin.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, ConfigError> {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let parsed = origins
            .iter()
            .map(|o| HeaderValue::from_str(o).map_err(|_| ConfigError::InvalidOrigin(o.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(parsed)
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
