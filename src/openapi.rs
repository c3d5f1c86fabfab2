//! OpenAPI document, served at `/openapi.json` outside production.

use crate::config::Settings;
use crate::error::{ErrorBody, ErrorDetail};
use crate::handlers::{self, APP_NAME};
use crate::models::{User, UserCreate, UserUpdate};
use crate::response::{ApiInfo, EnvironmentInfo, HealthBody, MultiDependency, PaginatedUsers, ReadyBody, RootBody, SearchResults};
use crate::routes::common;
use utoipa::OpenApi;

pub const DESCRIPTION: &str = "API Endpoint for Project";

#[derive(OpenApi)]
#[openapi(
    paths(
        common::root,
        common::health,
        common::ready,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::examples::paginated_users,
        handlers::examples::search_users,
        handlers::examples::api_info,
        handlers::examples::multi_dependency
    ),
    components(schemas(
        User, UserCreate, UserUpdate, ErrorBody, ErrorDetail, RootBody, HealthBody, ReadyBody,
        PaginatedUsers, SearchResults, ApiInfo, EnvironmentInfo, MultiDependency
    )),
    tags(
        (name = "common", description = "Banner and probes"),
        (name = "users", description = "User CRUD with optimistic locking"),
        (name = "examples", description = "Pagination, search and settings demonstrations")
    )
)]
pub struct ApiDoc;

/// The document with title, description and version filled in from settings.
pub fn openapi(settings: &Settings) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = APP_NAME.to_string();
    doc.info.description = Some(DESCRIPTION.to_string());
    doc.info.version = settings.app_version.clone();
    doc
}
