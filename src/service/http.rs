use super::IncidentService;
use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{Incident, IncidentInput, PaginatedResponse, QueryParams};
use async_trait::async_trait;
use reqwest::Method;

const INCIDENTS_PATH: &str = "incidents";

/// Incident operations over the REST API
#[derive(Debug, Clone)]
pub struct HttpIncidentService {
    api: ApiClient,
}

impl HttpIncidentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[async_trait]
impl IncidentService for HttpIncidentService {
    async fn list(&self, params: &QueryParams) -> Result<PaginatedResponse<Incident>> {
        let url = self.api.url(&[INCIDENTS_PATH], params.to_pairs());
        self.api.get(url).await
    }

    async fn get(&self, id: &str) -> Result<Incident> {
        let url = self.api.url(&[INCIDENTS_PATH, id], no_query());
        self.api.get(url).await
    }

    async fn create(&self, input: &IncidentInput) -> Result<Incident> {
        let url = self.api.url(&[INCIDENTS_PATH], no_query());
        self.api.send_json(Method::POST, url, input).await
    }

    async fn update(&self, id: &str, input: &IncidentInput) -> Result<Incident> {
        let url = self.api.url(&[INCIDENTS_PATH, id], no_query());
        self.api.send_json(Method::PUT, url, input).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.api.url(&[INCIDENTS_PATH, id], no_query());
        self.api.delete(url).await
    }
}

fn no_query() -> [(&'static str, &'static str); 0] {
    []
}
