pub mod cache;
pub mod queries;

pub use cache::{CacheKey, QueryCache};
pub use queries::{IncidentQueries, INCIDENTS};
