//! Safe SQL builder: identifiers from declared schemas only, values as parameters.

mod builder;
pub use builder::*;
