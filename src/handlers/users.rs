//! User CRUD handlers. Each request runs in its own session; writes commit explicitly.

use crate::error::{AppError, ErrorBody};
use crate::extractors::{ExpectedVersion, Pagination, UserId, ValidatedJson};
use crate::models::{User, UserCreate, UserUpdate};
use crate::service::UserRepository;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// List users, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(
        ("skip" = Option<i64>, Query, description = "Number of records to skip (default 0)"),
        ("limit" = Option<i64>, Query, description = "Maximum number of records to return, 1 to 100 (default 20)"),
    ),
    responses(
        (status = 200, body = Vec<User>),
        (status = 422, body = ErrorBody),
    )
)]
pub async fn list_users(State(state): State<AppState>, page: Pagination) -> Result<Json<Vec<User>>, AppError> {
    let users = state
        .db
        .with_session(|session| Box::pin(async move { UserRepository::list(session, page.skip, page.limit).await }))
        .await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = UserCreate,
    responses(
        (status = 201, body = User),
        (status = 422, body = ErrorBody),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UserCreate>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state
        .db
        .with_session(|session| {
            Box::pin(async move {
                let user = UserRepository::create(session, input).await?;
                session.commit().await?;
                Ok::<_, AppError>(user)
            })
        })
        .await?;
    tracing::info!(id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, body = User),
        (status = 404, body = ErrorBody),
    )
)]
pub async fn get_user(State(state): State<AppState>, UserId(id): UserId) -> Result<Json<User>, AppError> {
    let user = state
        .db
        .with_session(|session| Box::pin(async move { UserRepository::get(session, id).await }))
        .await?;
    Ok(Json(user))
}

/// Update name and/or title. `version` must match the stored version.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 200, body = User),
        (status = 404, body = ErrorBody),
        (status = 422, body = ErrorBody),
        (status = 500, description = "Stale version", body = ErrorBody),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    ValidatedJson(changes): ValidatedJson<UserUpdate>,
) -> Result<Json<User>, AppError> {
    let user = state
        .db
        .with_session(|session| {
            Box::pin(async move {
                let user = UserRepository::update(session, id, changes).await?;
                session.commit().await?;
                Ok::<_, AppError>(user)
            })
        })
        .await?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "users",
    params(
        ("id" = uuid::Uuid, Path, description = "User id"),
        ("version" = i32, Query, description = "Last version read"),
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, body = ErrorBody),
        (status = 500, description = "Stale version", body = ErrorBody),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    expected: ExpectedVersion,
) -> Result<StatusCode, AppError> {
    state
        .db
        .with_session(|session| {
            Box::pin(async move {
                UserRepository::delete(session, id, expected.version).await?;
                session.commit().await?;
                Ok::<_, AppError>(())
            })
        })
        .await?;
    tracing::info!(%id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
