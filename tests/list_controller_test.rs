//! Integration tests for list state, paging and the open action

mod common;

use common::{controller, valid_input, CountingService};
use incident_report_client::error::AppError;
use incident_report_client::list::{ActionState, FormTarget, Notification};
use incident_report_client::models::{Category, IncidentInput, SortBy, SortOrder, Status};
use incident_report_client::service::IncidentService;
use std::sync::Arc;
use tokio::time::{sleep_until, Instant};

#[tokio::test]
async fn test_paging_through_results() {
    let service = Arc::new(CountingService::seeded(23));
    let (_, mut list) = controller(&service);

    list.refresh().await.unwrap();
    let summary = list.summary().unwrap();
    assert_eq!(summary.to_string(), "Showing 1 to 10 of 23 results");
    assert_eq!(summary.total_pages, 3);
    assert!(!summary.has_previous());

    assert!(list.next_page());
    list.refresh().await.unwrap();
    assert!(list.next_page());
    list.refresh().await.unwrap();

    let summary = list.summary().unwrap();
    assert_eq!(summary.to_string(), "Showing 21 to 23 of 23 results");
    assert!(!summary.has_next());
    assert!(!list.next_page());

    assert!(list.previous_page());
    assert_eq!(list.filters().page, 2);
}

#[tokio::test]
async fn test_last_partial_page_disables_next() {
    let service = Arc::new(CountingService::seeded(15));
    let (_, mut list) = controller(&service);

    list.refresh().await.unwrap();
    assert!(list.set_page(2));
    list.refresh().await.unwrap();

    let summary = list.summary().unwrap();
    assert_eq!(summary.to_string(), "Showing 11 to 15 of 15 results");
    assert!(!summary.has_next());
    assert_eq!(list.current().unwrap().data.len(), 5);

    // Beyond the last page clamps.
    assert!(!list.set_page(9));
    assert_eq!(list.filters().page, 2);
}

#[tokio::test]
async fn test_category_change_returns_to_first_page() {
    let service = Arc::new(CountingService::seeded(23));
    let (_, mut list) = controller(&service);

    list.refresh().await.unwrap();
    list.set_page(2);
    list.refresh().await.unwrap();

    assert!(list.set_category(Some(Category::Maintenance)));
    assert_eq!(list.filters().page, 1);

    let page = list.refresh().await.unwrap();
    assert_eq!(page.total, 11);
    assert!(page.data.iter().all(|i| i.category == Category::Maintenance));
}

#[tokio::test]
async fn test_page_size_change_keeps_filters() {
    let service = Arc::new(CountingService::seeded(23));
    let (_, mut list) = controller(&service);

    list.set_category(Some(Category::Safety));
    list.set_sort(SortBy::Title, SortOrder::Asc);
    list.refresh().await.unwrap();
    list.set_page(2);

    assert!(list.set_page_size(5));
    let params = list.query_params();
    assert_eq!(params.category, Some(Category::Safety));
    assert_eq!(params.sort_by, SortBy::Title);
    assert_eq!(params.sort_order, SortOrder::Asc);
    assert_eq!(params.page, 1);
    assert_eq!(params.page_size, 5);

    let page = list.refresh().await.unwrap();
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.total_pages, 3);
}

#[tokio::test(start_paused = true)]
async fn test_search_applies_after_typing_stops() {
    let service = Arc::new(CountingService::seeded(10));
    let (_, mut list) = controller(&service);
    list.refresh().await.unwrap();

    list.set_search_input("val");
    list.set_search_input("valve 3");
    assert_eq!(list.filters().search, None);

    let deadline = list.search_deadline().unwrap();
    sleep_until(deadline).await;
    assert!(list.settle_search(Instant::now()));

    let page = list.refresh().await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.data[0].title, "Leaking valve 3");
    assert_eq!(service.list_calls(), 2);
}

#[tokio::test]
async fn test_failed_create_keeps_form_open() {
    let service = Arc::new(CountingService::seeded(3));
    let (queries, mut list) = controller(&service);
    list.refresh().await.unwrap();

    service.fail_next_write(AppError::api(409, Some("Title already exists".to_string())));
    list.open_create().unwrap();
    let err = list.submit_form(valid_input("Leaking valve 1")).await.unwrap_err();

    assert_eq!(err.to_string(), "Title already exists");
    assert_eq!(
        list.action(),
        &ActionState::Form {
            target: FormTarget::Create,
            submitting: false
        }
    );
    assert_eq!(
        list.take_notification(),
        Some(Notification::error("Title already exists"))
    );
    assert!(queries.is_list_fresh(&list.query_params()));

    // Retry from the same form succeeds.
    list.submit_form(valid_input("Leaking valve 99")).await.unwrap();
    assert_eq!(list.action(), &ActionState::Idle);
    assert_eq!(
        list.take_notification(),
        Some(Notification::success("Incident created successfully!"))
    );
    assert!(!queries.is_list_fresh(&list.query_params()));
    assert_eq!(list.refresh().await.unwrap().total, 4);
}

#[tokio::test]
async fn test_invalid_input_never_reaches_service() {
    let service = Arc::new(CountingService::new());
    let (_, mut list) = controller(&service);

    list.open_create().unwrap();
    let input = IncidentInput::new("ab", "too short", Category::Safety, Status::Open);
    let err = list.submit_form(input).await.unwrap_err();

    let AppError::Validation(failure) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(
        failure.message_for("title"),
        Some("Title must be at least 3 characters")
    );
    assert_eq!(
        failure.message_for("description"),
        Some("Description must be at least 10 characters")
    );
    assert_eq!(service.write_calls(), 0);
    assert!(matches!(list.action(), ActionState::Form { .. }));
}

#[tokio::test]
async fn test_edit_row_updates_incident() {
    let service = Arc::new(CountingService::seeded(3));
    let (_, mut list) = controller(&service);
    list.refresh().await.unwrap();

    let row = list.row(0).cloned().unwrap();
    list.open_edit(row.clone()).unwrap();

    let mut input = row.to_input();
    input.status = Status::InProgress;
    let updated = list.submit_form(input).await.unwrap();

    assert_eq!(updated.id, row.id);
    assert_eq!(updated.status, Status::InProgress);
    assert_eq!(
        list.take_notification(),
        Some(Notification::success("Incident updated successfully!"))
    );
    assert_eq!(list.refresh().await.unwrap().data[0].status, Status::InProgress);
}

#[tokio::test]
async fn test_deleting_last_row_moves_back_a_page() {
    let service = Arc::new(CountingService::seeded(11));
    let (_, mut list) = controller(&service);

    list.refresh().await.unwrap();
    list.set_page(2);
    let id = list.refresh().await.unwrap().data[0].id.clone();

    list.open_delete(id).unwrap();
    list.confirm_delete().await.unwrap();
    assert_eq!(
        list.take_notification(),
        Some(Notification::success("Incident deleted successfully!"))
    );

    let page = list.refresh().await.unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.total, 10);
    assert_eq!(list.filters().page, 1);
}

#[tokio::test]
async fn test_emptied_list_returns_to_first_page() {
    let service = Arc::new(CountingService::seeded(11));
    let (queries, mut list) = controller(&service);

    list.refresh().await.unwrap();
    list.set_page(2);
    list.refresh().await.unwrap();

    for n in 0..11 {
        service.inner().delete(&format!("inc-{:03}", n)).await.unwrap();
    }
    queries.invalidate();

    let page = list.refresh().await.unwrap();
    assert_eq!(page.page, 1);
    assert_eq!(page.total, 0);
    assert_eq!(list.filters().page, 1);
    assert!(!list.summary().unwrap().has_previous());
}

#[tokio::test]
async fn test_failed_delete_keeps_confirmation() {
    let service = Arc::new(CountingService::seeded(2));
    let (_, mut list) = controller(&service);

    list.open_delete("inc-000").unwrap();
    service.fail_next_write(AppError::transport("connection reset"));
    assert!(list.confirm_delete().await.is_err());

    assert_eq!(
        list.action(),
        &ActionState::ConfirmDelete {
            id: "inc-000".to_string(),
            submitting: false
        }
    );
    assert_eq!(
        list.take_notification(),
        Some(Notification::error("Something went wrong"))
    );
    assert_eq!(service.inner().len(), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_page() {
    let service = Arc::new(CountingService::seeded(4));
    let (queries, mut list) = controller(&service);
    list.refresh().await.unwrap();

    queries.invalidate();
    service.fail_next_read(AppError::api(503, None));
    assert!(list.refresh().await.is_err());

    assert_eq!(list.current().unwrap().total, 4);
    assert_eq!(
        list.take_notification(),
        Some(Notification::error("Something went wrong"))
    );

    // Still usable afterwards.
    assert_eq!(list.refresh().await.unwrap().total, 4);
}
