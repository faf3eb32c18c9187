//! List view state: filters, paging and the open action.

pub mod controller;
pub mod pagination;

pub use controller::{
    ActionState, FormTarget, ListController, ListFilters, Notification, NotificationLevel,
};
pub use pagination::{total_pages, PageSummary};
