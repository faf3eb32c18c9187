//! State behind the incident list view.
//!
//! The controller owns everything the list shows: filters, sort, paging, the
//! raw and settled search text, the last loaded page, the open form or
//! delete confirmation, and the latest notification. Query parameters are
//! derived from that state and used as the cache key for every load.

use super::pagination::PageSummary;
use crate::config::ListConfig;
use crate::debounce::Debounce;
use crate::error::{AppError, Result};
use crate::models::{
    normalize_search, Category, Incident, IncidentInput, PaginatedResponse, QueryParams, SortBy,
    SortOrder, Status,
};
use crate::state::IncidentQueries;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;

/// User-selected filter, sort and paging state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilters {
    /// Settled (debounced) search text
    pub search: Option<String>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl ListFilters {
    pub fn new(page_size: u32) -> Self {
        Self {
            search: None,
            category: None,
            status: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// The list read these filters describe
    pub fn query_params(&self) -> QueryParams {
        QueryParams {
            search: self.search.clone(),
            category: self.category,
            status: self.status,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            page: self.page,
            page_size: self.page_size,
        }
        .normalized()
    }
}

impl Default for ListFilters {
    fn default() -> Self {
        Self::new(QueryParams::default().page_size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormTarget {
    Create,
    Edit(Incident),
}

/// The one form or confirmation that may be open
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActionState {
    #[default]
    Idle,
    Form {
        target: FormTarget,
        submitting: bool,
    },
    ConfirmDelete {
        id: String,
        submitting: bool,
    },
}

impl ActionState {
    pub fn is_submitting(&self) -> bool {
        matches!(
            self,
            ActionState::Form { submitting: true, .. }
                | ActionState::ConfirmDelete { submitting: true, .. }
        )
    }

    fn set_submitting(&mut self, value: bool) {
        match self {
            ActionState::Form { submitting, .. } | ActionState::ConfirmDelete { submitting, .. } => {
                *submitting = value
            }
            ActionState::Idle => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Composition root of the list view
pub struct ListController {
    queries: Arc<IncidentQueries>,
    filters: ListFilters,
    search_input: String,
    search_debounce: Debounce<String>,
    current: Option<PaginatedResponse<Incident>>,
    action: ActionState,
    notification: Option<Notification>,
}

impl ListController {
    pub fn new(queries: Arc<IncidentQueries>, config: &ListConfig) -> Self {
        Self {
            queries,
            filters: ListFilters::new(config.page_size),
            search_input: String::new(),
            search_debounce: Debounce::new(config.search_debounce()),
            current: None,
            action: ActionState::Idle,
            notification: None,
        }
    }

    pub fn filters(&self) -> &ListFilters {
        &self.filters
    }

    pub fn query_params(&self) -> QueryParams {
        self.filters.query_params()
    }

    /// Search text as typed, before debouncing
    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Last page loaded by [`ListController::refresh`]
    pub fn current(&self) -> Option<&PaginatedResponse<Incident>> {
        self.current.as_ref()
    }

    pub fn summary(&self) -> Option<PageSummary> {
        self.current.as_ref().map(PageSummary::from_response)
    }

    pub fn action(&self) -> &ActionState {
        &self.action
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    /// Record typed search text; it takes effect once it settles
    pub fn set_search_input(&mut self, text: impl Into<String>) {
        self.set_search_input_at(text, Instant::now());
    }

    pub fn set_search_input_at(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.search_input = text.clone();
        self.search_debounce.arm(text, now);
    }

    /// When pending search text settles, if any is pending
    pub fn search_deadline(&self) -> Option<Instant> {
        self.search_debounce.deadline()
    }

    /// Apply settled search text. Returns true when the query changed.
    pub fn settle_search(&mut self, now: Instant) -> bool {
        match self.search_debounce.take_due(now) {
            Some(text) => self.apply_search(&text),
            None => false,
        }
    }

    /// Apply pending search text immediately
    pub fn flush_search(&mut self) -> bool {
        match self.search_debounce.cancel() {
            Some(text) => self.apply_search(&text),
            None => false,
        }
    }

    fn apply_search(&mut self, text: &str) -> bool {
        let search = normalize_search(Some(text));
        if search == self.filters.search {
            return false;
        }

        debug!(search = ?search, "Search settled");
        self.filters.search = search;
        self.filters.page = 1;
        true
    }

    pub fn set_category(&mut self, category: Option<Category>) -> bool {
        if self.filters.category == category {
            return false;
        }
        self.filters.category = category;
        self.filters.page = 1;
        true
    }

    pub fn set_status(&mut self, status: Option<Status>) -> bool {
        if self.filters.status == status {
            return false;
        }
        self.filters.status = status;
        self.filters.page = 1;
        true
    }

    /// Change sort; filters and page are kept
    pub fn set_sort(&mut self, sort_by: SortBy, sort_order: SortOrder) -> bool {
        if self.filters.sort_by == sort_by && self.filters.sort_order == sort_order {
            return false;
        }
        self.filters.sort_by = sort_by;
        self.filters.sort_order = sort_order;
        true
    }

    /// Change rows per page; filters are kept, paging restarts at page 1
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        if self.filters.page_size == page_size {
            return false;
        }
        self.filters.page_size = page_size;
        self.filters.page = 1;
        true
    }

    /// Jump to a page, clamped to the pages of the last loaded result
    pub fn set_page(&mut self, page: u32) -> bool {
        let last = self
            .current
            .as_ref()
            .map(|current| current.total_pages.max(1))
            .unwrap_or(u32::MAX);
        let page = page.clamp(1, last);
        if self.filters.page == page {
            return false;
        }
        self.filters.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        match self.summary() {
            Some(summary) if summary.has_next() => self.set_page(self.filters.page + 1),
            _ => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.filters.page > 1 {
            self.set_page(self.filters.page - 1)
        } else {
            false
        }
    }

    /// Load the page the filters describe.
    ///
    /// A failed load keeps the previous page and records an error notification.
    /// When the requested page no longer exists (rows were deleted), the last
    /// existing page is loaded instead, or page 1 once nothing is left.
    pub async fn refresh(&mut self) -> Result<&PaginatedResponse<Incident>> {
        let mut response = self.load().await?;

        let last = response.total_pages.max(1);
        if self.filters.page > last {
            self.filters.page = last;
            response = self.load().await?;
        }

        Ok(self.current.insert(response))
    }

    async fn load(&mut self) -> Result<PaginatedResponse<Incident>> {
        let params = self.query_params();
        match self.queries.list(&params).await {
            Ok(response) => Ok(response),
            Err(err) => {
                self.notification = Some(Notification::error(err.user_message()));
                Err(err)
            }
        }
    }

    pub fn open_create(&mut self) -> Result<()> {
        self.open(ActionState::Form {
            target: FormTarget::Create,
            submitting: false,
        })
    }

    pub fn open_edit(&mut self, incident: Incident) -> Result<()> {
        self.open(ActionState::Form {
            target: FormTarget::Edit(incident),
            submitting: false,
        })
    }

    pub fn open_delete(&mut self, id: impl Into<String>) -> Result<()> {
        self.open(ActionState::ConfirmDelete {
            id: id.into(),
            submitting: false,
        })
    }

    /// Row `index` (0-based) of the loaded page
    pub fn row(&self, index: usize) -> Option<&Incident> {
        self.current.as_ref().and_then(|page| page.data.get(index))
    }

    /// Close whatever is open; refused while a submission is running
    pub fn cancel_action(&mut self) -> Result<()> {
        if self.action.is_submitting() {
            return Err(AppError::ActionInProgress);
        }
        self.action = ActionState::Idle;
        Ok(())
    }

    fn open(&mut self, action: ActionState) -> Result<()> {
        if self.action.is_submitting() {
            return Err(AppError::ActionInProgress);
        }
        self.action = action;
        Ok(())
    }

    /// Submit the open form.
    ///
    /// Invalid input is rejected before any request and the form stays open.
    /// A failed request also keeps the form open and records the server's
    /// message as an error notification.
    pub async fn submit_form(&mut self, input: IncidentInput) -> Result<Incident> {
        let target = match &self.action {
            ActionState::Form {
                target,
                submitting: false,
            } => target.clone(),
            action if action.is_submitting() => return Err(AppError::ActionInProgress),
            _ => return Err(AppError::NoActiveAction),
        };

        input.check()?;

        self.action.set_submitting(true);
        let (result, success_message) = match &target {
            FormTarget::Create => (
                self.queries.create(&input).await,
                "Incident created successfully!",
            ),
            FormTarget::Edit(incident) => (
                self.queries.update(&incident.id, &input).await,
                "Incident updated successfully!",
            ),
        };

        match result {
            Ok(incident) => {
                self.action = ActionState::Idle;
                self.notification = Some(Notification::success(success_message));
                Ok(incident)
            }
            Err(err) => {
                self.action.set_submitting(false);
                self.notification = Some(Notification::error(err.user_message()));
                Err(err)
            }
        }
    }

    /// Confirm the open delete dialog
    pub async fn confirm_delete(&mut self) -> Result<()> {
        let id = match &self.action {
            ActionState::ConfirmDelete {
                id,
                submitting: false,
            } => id.clone(),
            action if action.is_submitting() => return Err(AppError::ActionInProgress),
            _ => return Err(AppError::NoActiveAction),
        };

        self.action.set_submitting(true);
        match self.queries.delete(&id).await {
            Ok(()) => {
                self.action = ActionState::Idle;
                self.notification = Some(Notification::success("Incident deleted successfully!"));
                Ok(())
            }
            Err(err) => {
                self.action.set_submitting(false);
                self.notification = Some(Notification::error(err.user_message()));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemoryIncidentService;
    use std::time::Duration;

    fn controller() -> ListController {
        let queries = IncidentQueries::with_stale_time(
            Arc::new(InMemoryIncidentService::new()),
            Duration::from_secs(30),
        );
        ListController::new(Arc::new(queries), &ListConfig::default())
    }

    #[test]
    fn test_query_params_are_pure() {
        let filters = ListFilters {
            search: Some("  valve ".to_string()),
            category: Some(Category::Maintenance),
            ..ListFilters::default()
        };
        assert_eq!(filters.query_params(), filters.clone().query_params());
        assert_eq!(filters.query_params().search.as_deref(), Some("valve"));
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut list = controller();
        list.filters.page = 3;

        assert!(list.set_category(Some(Category::Safety)));
        assert_eq!(list.filters().page, 1);

        list.filters.page = 2;
        assert!(!list.set_category(Some(Category::Safety)));
        assert_eq!(list.filters().page, 2);

        assert!(list.set_status(Some(Status::Open)));
        assert_eq!(list.filters().page, 1);
    }

    #[test]
    fn test_page_size_and_sort_keep_filters() {
        let mut list = controller();
        list.set_category(Some(Category::Safety));
        list.set_status(Some(Status::InProgress));
        list.filters.page = 2;

        assert!(list.set_sort(SortBy::Title, SortOrder::Asc));
        assert_eq!(list.filters().page, 2);

        assert!(list.set_page_size(25));
        assert_eq!(list.filters().category, Some(Category::Safety));
        assert_eq!(list.filters().status, Some(Status::InProgress));
        assert_eq!(list.filters().page_size, 25);
        assert_eq!(list.filters().page, 1);
    }

    #[test]
    fn test_search_settles_after_quiet_period() {
        let mut list = controller();
        let t0 = Instant::now();
        list.filters.page = 4;

        list.set_search_input_at("p", t0);
        list.set_search_input_at("pu", t0 + Duration::from_millis(100));
        list.set_search_input_at("pump", t0 + Duration::from_millis(600));
        assert_eq!(list.search_input(), "pump");

        assert!(!list.settle_search(t0 + Duration::from_millis(1099)));
        assert_eq!(list.filters().search, None);
        assert_eq!(list.search_deadline(), Some(t0 + Duration::from_millis(1100)));

        assert!(list.settle_search(t0 + Duration::from_millis(1100)));
        assert_eq!(list.filters().search.as_deref(), Some("pump"));
        assert_eq!(list.filters().page, 1);
        assert_eq!(list.search_deadline(), None);
    }

    #[test]
    fn test_blank_search_clears_filter() {
        let mut list = controller();
        list.set_search_input("leak");
        assert!(list.flush_search());

        list.set_search_input("   ");
        assert!(list.flush_search());
        assert_eq!(list.filters().search, None);
        assert!(!list.query_params().to_query_string().contains("search"));
    }

    #[test]
    fn test_one_action_at_a_time() {
        let mut list = controller();
        list.open_create().unwrap();
        list.open_delete("abc").unwrap();
        assert_eq!(
            list.action(),
            &ActionState::ConfirmDelete {
                id: "abc".to_string(),
                submitting: false
            }
        );

        list.action.set_submitting(true);
        assert_eq!(list.open_create(), Err(AppError::ActionInProgress));
        assert_eq!(list.cancel_action(), Err(AppError::ActionInProgress));

        list.action.set_submitting(false);
        list.cancel_action().unwrap();
        assert_eq!(list.action(), &ActionState::Idle);
    }

    #[tokio::test]
    async fn test_submit_without_form_is_rejected() {
        let mut list = controller();
        let input = IncidentInput::new(
            "Blocked exit",
            "Pallets stacked in front of exit 4",
            Category::Safety,
            Status::Open,
        );
        assert_eq!(list.submit_form(input).await, Err(AppError::NoActiveAction));
        assert_eq!(list.confirm_delete().await, Err(AppError::NoActiveAction));
    }
}
