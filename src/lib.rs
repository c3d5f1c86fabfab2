//! Project API: user CRUD over PostgreSQL with request-scoped sessions and optimistic locking.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use config::{Environment, ProviderKind, Settings};
pub use db::{Database, DbSession, LifecycleState};
pub use error::{AppError, ConfigError, DbError, LifecycleError};
pub use migration::apply_schema;
pub use routes::app;
pub use service::UserRepository;
pub use state::AppState;
