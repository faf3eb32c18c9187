use super::IncidentService;
use crate::error::{AppError, Result};
use crate::models::{
    Incident, IncidentInput, PaginatedResponse, QueryParams, SortBy, SortOrder,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

const NOT_FOUND_STATUS: u16 = 404;

/// In-process incident service with the same filtering, sorting and paging
/// rules as the REST backend
#[derive(Debug, Clone, Default)]
pub struct InMemoryIncidentService {
    incidents: Arc<DashMap<String, Incident>>,
}

impl InMemoryIncidentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, replacing any record with the same ID
    pub fn insert(&self, incident: Incident) {
        self.incidents.insert(incident.id.clone(), incident);
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    fn not_found() -> AppError {
        AppError::api(NOT_FOUND_STATUS, Some("incident not found".to_string()))
    }

    fn matches(incident: &Incident, params: &QueryParams, needle: Option<&str>) -> bool {
        if params.category.is_some_and(|c| c != incident.category) {
            return false;
        }
        if params.status.is_some_and(|s| s != incident.status) {
            return false;
        }
        match needle {
            Some(needle) => {
                incident.title.to_lowercase().contains(needle)
                    || incident.description.to_lowercase().contains(needle)
            }
            None => true,
        }
    }

    fn compare(a: &Incident, b: &Incident, sort_by: SortBy) -> Ordering {
        let ordering = match sort_by {
            SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            SortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortBy::Title => a.title.cmp(&b.title),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    }
}

#[async_trait]
impl IncidentService for InMemoryIncidentService {
    async fn list(&self, params: &QueryParams) -> Result<PaginatedResponse<Incident>> {
        let params = params.clone().normalized();
        let needle = params.search.as_deref().map(str::to_lowercase);

        let mut matching: Vec<Incident> = self
            .incidents
            .iter()
            .filter(|entry| Self::matches(entry.value(), &params, needle.as_deref()))
            .map(|entry| entry.value().clone())
            .collect();

        matching.sort_by(|a, b| {
            let ordering = Self::compare(a, b, params.sort_by);
            match params.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(params.offset()).unwrap_or(usize::MAX))
            .take(params.page_size as usize)
            .collect();

        Ok(PaginatedResponse::new(data, total, params.page, params.page_size))
    }

    async fn get(&self, id: &str) -> Result<Incident> {
        self.incidents
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(Self::not_found)
    }

    async fn create(&self, input: &IncidentInput) -> Result<Incident> {
        let now = Utc::now();
        let incident = Incident {
            id: Uuid::new_v4().to_string(),
            title: input.title.clone(),
            description: input.description.clone(),
            category: input.category,
            status: input.status,
            created_at: now,
            updated_at: now,
        };

        self.insert(incident.clone());
        tracing::debug!(incident_id = %incident.id, "Incident created in memory");
        Ok(incident)
    }

    async fn update(&self, id: &str, input: &IncidentInput) -> Result<Incident> {
        let mut entry = self.incidents.get_mut(id).ok_or_else(Self::not_found)?;
        let incident = entry.value_mut();

        incident.title = input.title.clone();
        incident.description = input.description.clone();
        incident.category = input.category;
        incident.status = input.status;
        incident.updated_at = Utc::now().max(incident.created_at);

        tracing::debug!(incident_id = %id, "Incident updated in memory");
        Ok(incident.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        match self.incidents.remove(id) {
            Some(_) => {
                tracing::debug!(incident_id = %id, "Incident deleted in memory");
                Ok(())
            }
            None => Err(Self::not_found()),
        }
    }
}
