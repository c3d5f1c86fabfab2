//! Demonstration endpoints combining pagination, search, settings and the database.

use crate::error::{AppError, ErrorBody};
use crate::extractors::{Pagination, SearchParams};
use crate::response::{ApiInfo, EnvironmentInfo, MultiDependency, PaginatedUsers, SearchResults};
use crate::service::UserRepository;
use crate::sql::UserSort;
use crate::state::AppState;
use axum::{extract::State, Json};

pub const APP_NAME: &str = "Project API";

/// Users newest first, with the total count.
#[utoipa::path(
    get,
    path = "/api/v1/examples/users/paginated",
    tag = "examples",
    params(
        ("skip" = Option<i64>, Query, description = "Number of records to skip (default 0)"),
        ("limit" = Option<i64>, Query, description = "1 to 100 (default 20)"),
    ),
    responses((status = 200, body = PaginatedUsers), (status = 422, body = ErrorBody))
)]
pub async fn paginated_users(
    State(state): State<AppState>,
    page: Pagination,
) -> Result<Json<PaginatedUsers>, AppError> {
    let (total, users) = state
        .db
        .with_session(|session| {
            Box::pin(async move {
                let total = UserRepository::count(session, None).await?;
                let users = UserRepository::search(session, None, UserSort::NEWEST_FIRST, page.skip, page.limit).await?;
                Ok::<_, AppError>((total, users))
            })
        })
        .await?;
    Ok(Json(PaginatedUsers {
        total,
        skip: page.skip,
        limit: page.limit,
        users,
    }))
}

/// Case-insensitive search on name and title with sorting; `total` counts all matches.
#[utoipa::path(
    get,
    path = "/api/v1/examples/users/search",
    tag = "examples",
    params(
        ("q" = Option<String>, Query, description = "Substring of name or title"),
        ("sort_by" = Option<String>, Query, description = "name, title, created_at or updated_at"),
        ("order" = Option<String>, Query, description = "asc or desc (default asc)"),
        ("skip" = Option<i64>, Query, description = "Number of records to skip (default 0)"),
        ("limit" = Option<i64>, Query, description = "1 to 100 (default 20)"),
    ),
    responses((status = 200, body = SearchResults), (status = 422, body = ErrorBody))
)]
pub async fn search_users(
    State(state): State<AppState>,
    search: SearchParams,
    page: Pagination,
) -> Result<Json<SearchResults>, AppError> {
    let sort = search.sort();
    let q = search.q.clone();
    let (total, users) = state
        .db
        .with_session(|session| {
            Box::pin(async move {
                let total = UserRepository::count(session, q.as_deref()).await?;
                let users = UserRepository::search(session, q.as_deref(), sort, page.skip, page.limit).await?;
                Ok::<_, AppError>((total, users))
            })
        })
        .await?;
    Ok(Json(SearchResults {
        total,
        skip: page.skip,
        limit: page.limit,
        query: search.q,
        sort_by: search.sort_by.map(|f| f.column().to_string()),
        order: search.order.as_str(),
        users,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/examples/info",
    tag = "examples",
    responses((status = 200, body = ApiInfo))
)]
pub async fn api_info(State(state): State<AppState>) -> Json<ApiInfo> {
    let settings = &state.settings;
    Json(ApiInfo {
        app: APP_NAME,
        version: settings.app_version.clone(),
        environment: settings.environment.as_str(),
        debug_mode: settings.debug,
        database_provider: settings.database.provider.as_str(),
    })
}

/// Settings, pagination and the database in one handler.
#[utoipa::path(
    get,
    path = "/api/v1/examples/multi-dependency",
    tag = "examples",
    params(
        ("skip" = Option<i64>, Query, description = "Number of records to skip (default 0)"),
        ("limit" = Option<i64>, Query, description = "1 to 100 (default 20)"),
    ),
    responses((status = 200, body = MultiDependency), (status = 422, body = ErrorBody))
)]
pub async fn multi_dependency(
    State(state): State<AppState>,
    page: Pagination,
) -> Result<Json<MultiDependency>, AppError> {
    let total_users = state
        .db
        .with_session(|session| Box::pin(async move { UserRepository::count(session, None).await }))
        .await?;
    Ok(Json(MultiDependency {
        environment: EnvironmentInfo {
            environment: state.settings.environment.as_str(),
            version: state.settings.app_version.clone(),
        },
        pagination: page,
        total_users,
        message: "This endpoint demonstrates multiple dependencies",
    }))
}
