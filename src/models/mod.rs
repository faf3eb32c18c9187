pub mod incident;
pub mod query;

pub use incident::*;
pub use query::*;
