//! Router assembly: routes, error translation and the shared layers.

pub mod common;
pub mod examples;
pub mod users;

pub use common::common_routes;
pub use examples::example_routes;
pub use users::user_routes;

use crate::config::Settings;
use crate::error::ConfigError;
use crate::middleware::{cors_layer, handle_panic, translate_errors};
use crate::openapi::openapi;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size fail JSON extraction and are rejected as `json_invalid`.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// GET /openapi.json
pub fn openapi_routes(settings: &Settings) -> Router<AppState> {
    let doc = openapi(settings);
    Router::new().route(
        "/openapi.json",
        get(move || {
            let doc = doc.clone();
            async move { Json(doc) }
        }),
    )
}

/// The full application. Fails only on invalid CORS origins.
pub fn app(state: AppState) -> Result<Router, ConfigError> {
    let settings = state.settings.clone();
    let mut router = Router::new()
        .merge(common_routes())
        .nest("/api/v1", user_routes().merge(example_routes()));
    if !settings.is_production() {
        router = router.merge(openapi_routes(&settings));
    }
    Ok(router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn_with_state(state.clone(), translate_errors))
        .layer(cors_layer(&settings.allowed_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
