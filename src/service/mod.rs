mod http;
mod memory;

pub use http::HttpIncidentService;
pub use memory::InMemoryIncidentService;

use crate::error::Result;
use crate::models::{Incident, IncidentInput, PaginatedResponse, QueryParams};
use async_trait::async_trait;

/// Domain operations on incidents
#[async_trait]
pub trait IncidentService: Send + Sync {
    /// List one page of incidents matching the parameters
    async fn list(&self, params: &QueryParams) -> Result<PaginatedResponse<Incident>>;

    /// Get an incident by ID
    async fn get(&self, id: &str) -> Result<Incident>;

    /// Create an incident
    async fn create(&self, input: &IncidentInput) -> Result<Incident>;

    /// Replace the editable fields of an incident
    async fn update(&self, id: &str, input: &IncidentInput) -> Result<Incident>;

    /// Delete an incident
    async fn delete(&self, id: &str) -> Result<()>;
}
