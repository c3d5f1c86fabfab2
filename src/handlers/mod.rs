//! HTTP handlers for users and the demonstration endpoints.

pub mod examples;
pub mod users;
pub use examples::*;
pub use users::*;
