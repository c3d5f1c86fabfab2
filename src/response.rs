//! Response bodies for the non-CRUD endpoints.

use crate::extractors::Pagination;
use crate::models::User;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct RootBody {
    pub message: &'static str,
    pub status: &'static str,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthBody {
    pub status: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyBody {
    pub status: &'static str,
    pub database: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsers {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResults {
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub order: &'static str,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiInfo {
    pub app: &'static str,
    pub version: String,
    pub environment: &'static str,
    pub debug_mode: bool,
    pub database_provider: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnvironmentInfo {
    pub environment: &'static str,
    pub version: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MultiDependency {
    pub environment: EnvironmentInfo,
    pub pagination: Pagination,
    pub total_users: i64,
    pub message: &'static str,
}
