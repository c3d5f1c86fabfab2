//! Entities and their column declarations.

pub mod base;
pub mod user;

pub use base::{ColumnDef, EntitySchema};
pub use user::{User, UserCreate, UserUpdate, USERS};

/// Every entity the migration binary manages.
pub const ENTITIES: &[&EntitySchema] = &[&USERS];
