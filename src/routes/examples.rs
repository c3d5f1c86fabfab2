//! Demonstration routes, nested under `/api/v1`.

use crate::handlers::{api_info, multi_dependency, paginated_users, search_users};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn example_routes() -> Router<AppState> {
    Router::new()
        .route("/examples/users/paginated", get(paginated_users))
        .route("/examples/users/search", get(search_users))
        .route("/examples/info", get(api_info))
        .route("/examples/multi-dependency", get(multi_dependency))
}
