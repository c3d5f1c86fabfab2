//! User CRUD routes, nested under `/api/v1`.

use crate::handlers::{create_user, delete_user, get_user, list_users, update_user};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user).patch(update_user).delete(delete_user))
}
