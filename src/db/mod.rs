//! Database access: engine provider, session factory, and the lifecycle that owns them.

mod engine;
mod lifecycle;
mod session;

pub use engine::{connect_options, get_engine, get_engine_by_name, migration_connection, Engine};
pub use lifecycle::{Database, LifecycleState};
pub use session::{DbSession, SessionFactory};
