//! Request extractors that reject with `AppError::Validation`.

mod body;
mod path;
mod query;

pub use body::ValidatedJson;
pub use path::UserId;
pub use query::{ExpectedVersion, Pagination, SearchParams, DEFAULT_LIMIT, MAX_LIMIT};
