use super::cache::{CacheKey, QueryCache};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::models::{Incident, IncidentInput, PaginatedResponse, QueryParams};
use crate::service::IncidentService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Resource kind under which every incident read is cached
pub const INCIDENTS: &str = "incidents";

/// Cached reads and invalidating writes for incidents.
///
/// Writes never touch cached values directly. A successful write marks every
/// incident read as invalidated so the next read goes back to the server; a
/// failed write leaves the cache exactly as it was.
#[derive(Clone)]
pub struct IncidentQueries {
    service: Arc<dyn IncidentService>,
    lists: QueryCache<PaginatedResponse<Incident>>,
    details: QueryCache<Incident>,
}

impl IncidentQueries {
    pub fn new(service: Arc<dyn IncidentService>, config: &CacheConfig) -> Self {
        Self::with_stale_time(service, config.stale_time())
    }

    pub fn with_stale_time(service: Arc<dyn IncidentService>, stale_time: Duration) -> Self {
        Self {
            service,
            lists: QueryCache::new(stale_time),
            details: QueryCache::new(stale_time),
        }
    }

    pub fn list_key(params: &QueryParams) -> CacheKey {
        CacheKey::new(INCIDENTS, format!("list?{}", params.to_query_string()))
    }

    pub fn detail_key(id: &str) -> CacheKey {
        CacheKey::new(INCIDENTS, format!("detail/{}", id))
    }

    /// One page of incidents
    pub async fn list(&self, params: &QueryParams) -> Result<PaginatedResponse<Incident>> {
        let service = Arc::clone(&self.service);
        let params = params.clone();

        self.lists
            .fetch_with(Self::list_key(&params), move || async move {
                service.list(&params).await
            })
            .await
    }

    /// A single incident
    pub async fn get(&self, id: &str) -> Result<Incident> {
        let service = Arc::clone(&self.service);
        let owned_id = id.to_string();

        self.details
            .fetch_with(Self::detail_key(id), move || async move {
                service.get(&owned_id).await
            })
            .await
    }

    pub async fn create(&self, input: &IncidentInput) -> Result<Incident> {
        let result = self.service.create(input).await;
        if let Ok(incident) = &result {
            info!(incident_id = %incident.id, "Incident created");
        }
        self.finish_write("create", result)
    }

    pub async fn update(&self, id: &str, input: &IncidentInput) -> Result<Incident> {
        let result = self.service.update(id, input).await;
        if result.is_ok() {
            info!(incident_id = %id, "Incident updated");
        }
        self.finish_write("update", result)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = self.service.delete(id).await;
        if result.is_ok() {
            info!(incident_id = %id, "Incident deleted");
        }
        self.finish_write("delete", result)
    }

    /// Drop trust in every cached incident read
    pub fn invalidate(&self) {
        self.lists.invalidate_kind(INCIDENTS);
        self.details.invalidate_kind(INCIDENTS);
    }

    /// Whether the page for `params` would be served without a request
    pub fn is_list_fresh(&self, params: &QueryParams) -> bool {
        self.lists.is_fresh(&Self::list_key(params))
    }

    pub fn cached_entries(&self) -> usize {
        self.lists.entry_count() + self.details.entry_count()
    }

    fn finish_write<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.invalidate(),
            Err(err) => warn!(operation, error = %err, "Incident write failed; cache untouched"),
        }
        result
    }
}
