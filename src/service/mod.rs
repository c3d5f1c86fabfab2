//! UserRepository and request validation.

mod users;
mod validation;
pub use users::UserRepository;
pub use validation::{FieldRule, FieldType, RequestValidator, Validate};
