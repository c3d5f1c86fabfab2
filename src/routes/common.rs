//! Common routes: banner, health, readiness.

use crate::response::{HealthBody, ReadyBody, RootBody};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

const WELCOME: &str = "Welcome to Project API";

#[utoipa::path(get, path = "/", tag = "common", responses((status = 200, body = RootBody)))]
pub async fn root(State(state): State<AppState>) -> Json<RootBody> {
    Json(RootBody {
        message: WELCOME,
        status: "running",
        version: state.settings.app_version.clone(),
    })
}

#[utoipa::path(get, path = "/health", tag = "common", responses((status = 200, body = HealthBody)))]
pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "healthy" })
}

/// 503 when the database probe fails.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "common",
    responses((status = 200, body = ReadyBody), (status = 503, body = ReadyBody))
)]
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    if state.db.health_check().await {
        (
            StatusCode::OK,
            Json(ReadyBody {
                status: "ok",
                database: "ok",
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: "unavailable",
            }),
        )
    }
}

/// GET /, GET /health, GET /ready.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
}
