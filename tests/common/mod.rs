//! Common test utilities for cache and controller testing
//!
//! [`CountingService`] wraps the in-memory service so tests can count the
//! calls that reach the "network", slow list reads down and make the next
//! read or write fail.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use incident_report_client::config::ListConfig;
use incident_report_client::error::{AppError, Result};
use incident_report_client::list::ListController;
use incident_report_client::models::{
    Category, Incident, IncidentInput, PaginatedResponse, QueryParams, Status,
};
use incident_report_client::service::{IncidentService, InMemoryIncidentService};
use incident_report_client::state::IncidentQueries;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const STALE_TIME: Duration = Duration::from_secs(30);

#[derive(Default)]
pub struct CountingService {
    inner: InMemoryIncidentService,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    write_calls: AtomicUsize,
    list_delay_ms: AtomicU64,
    next_read_error: Mutex<Option<AppError>>,
    next_write_error: Mutex<Option<AppError>>,
}

impl CountingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service pre-filled with `count` incidents, created one minute apart
    pub fn seeded(count: usize) -> Self {
        let service = Self::new();
        for n in 0..count {
            service.inner.insert(incident(&format!("inc-{:03}", n), n));
        }
        service
    }

    pub fn inner(&self) -> &InMemoryIncidentService {
        &self.inner
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Delay list responses; the result is computed before the delay
    pub fn set_list_delay(&self, delay: Duration) {
        self.list_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_next_read(&self, err: AppError) {
        *self.next_read_error.lock().unwrap() = Some(err);
    }

    pub fn fail_next_write(&self, err: AppError) {
        *self.next_write_error.lock().unwrap() = Some(err);
    }

    fn take_read_error(&self) -> Result<()> {
        match self.next_read_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn take_write_error(&self) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_write_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IncidentService for CountingService {
    async fn list(&self, params: &QueryParams) -> Result<PaginatedResponse<Incident>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.take_read_error()?;

        let result = self.inner.list(params).await;
        let delay = self.list_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        result
    }

    async fn get(&self, id: &str) -> Result<Incident> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.take_read_error()?;
        self.inner.get(id).await
    }

    async fn create(&self, input: &IncidentInput) -> Result<Incident> {
        self.take_write_error()?;
        self.inner.create(input).await
    }

    async fn update(&self, id: &str, input: &IncidentInput) -> Result<Incident> {
        self.take_write_error()?;
        self.inner.update(id, input).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.take_write_error()?;
        self.inner.delete(id).await
    }
}

/// Helper to create a test incident; `minute` orders creation times
pub fn incident(id: &str, minute: usize) -> Incident {
    let created = Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap()
        + ChronoDuration::minutes(minute as i64);
    let (category, title) = if minute % 2 == 0 {
        (Category::Safety, format!("Blocked fire exit {}", minute))
    } else {
        (Category::Maintenance, format!("Leaking valve {}", minute))
    };

    Incident {
        id: id.to_string(),
        title,
        description: "Reported during the morning walkthrough".to_string(),
        category,
        status: Status::Open,
        created_at: created,
        updated_at: created,
    }
}

pub fn valid_input(title: &str) -> IncidentInput {
    IncidentInput::new(
        title,
        "Spotted by the facilities team on level 2",
        Category::Maintenance,
        Status::Open,
    )
}

pub fn queries(service: &Arc<CountingService>) -> Arc<IncidentQueries> {
    let service: Arc<dyn IncidentService> = service.clone();
    Arc::new(IncidentQueries::with_stale_time(service, STALE_TIME))
}

pub fn controller(service: &Arc<CountingService>) -> (Arc<IncidentQueries>, ListController) {
    let queries = queries(service);
    let config = ListConfig {
        page_size: 10,
        search_debounce_ms: 500,
    };
    let controller = ListController::new(Arc::clone(&queries), &config);
    (queries, controller)
}
