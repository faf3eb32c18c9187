use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::incident::{Category, Status};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and paging parameters of a list read.
///
/// Also the cache key for list reads: two values that compare equal
/// serialize to the same query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryParams {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub status: Option<Status>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            status: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: 10,
        }
    }
}

impl QueryParams {
    /// Trims search text and folds empty text to absent; page and page size
    /// are raised to at least 1.
    pub fn normalized(mut self) -> Self {
        self.search = normalize_search(self.search.as_deref());
        self.page = self.page.max(1);
        self.page_size = self.page_size.max(1);
        self
    }

    /// Key/value pairs in wire order, skipping absent and empty fields
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(7);

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        pairs.push(("sort_by", self.sort_by.to_string()));
        pairs.push(("sort_order", self.sort_order.to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("page_size", self.page_size.to_string()));

        pairs
    }

    /// URL-encoded query string, without the leading `?`
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.to_pairs())
            .finish()
    }

    /// Offset of the first row on the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// Trim search text; whitespace-only text means "no search"
pub fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// One page of a list read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Build a page, deriving `total_pages` from `total` and `page_size`
    pub fn new(data: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            data,
            total,
            page,
            page_size,
            total_pages: crate::list::total_pages(total, page_size),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_omits_absent_and_empty_fields() {
        let params = QueryParams {
            search: Some(String::new()),
            category: None,
            ..Default::default()
        };

        let query = params.to_query_string();
        assert!(!query.contains("search"));
        assert!(!query.contains("category"));
        assert_eq!(query, "sort_by=created_at&sort_order=desc&page=1&page_size=10");
    }

    #[test]
    fn test_query_string_keeps_field_order_and_encodes() {
        let params = QueryParams {
            search: Some("gas leak".to_string()),
            category: Some(Category::Safety),
            status: Some(Status::InProgress),
            sort_by: SortBy::Title,
            sort_order: SortOrder::Asc,
            page: 3,
            page_size: 20,
        };

        assert_eq!(
            params.to_query_string(),
            "search=gas+leak&category=Safety&status=In+Progress&sort_by=title&sort_order=asc&page=3&page_size=20"
        );
    }

    #[test]
    fn test_normalized_trims_search() {
        let params = QueryParams {
            search: Some("   ".to_string()),
            page: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(params.search, None);
        assert_eq!(params.page, 1);

        let params = QueryParams {
            search: Some("  pump  ".to_string()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(params.search.as_deref(), Some("pump"));
    }

    #[test]
    fn test_equal_params_share_a_key() {
        let a = QueryParams {
            category: Some(Category::Maintenance),
            ..Default::default()
        };
        let b = QueryParams {
            category: Some(Category::Maintenance),
            ..Default::default()
        };
        assert_eq!(a, b);
        assert_eq!(a.to_query_string(), b.to_query_string());
    }

    #[test]
    fn test_offset() {
        let params = QueryParams {
            page: 2,
            page_size: 10,
            ..Default::default()
        };
        assert_eq!(params.offset(), 10);
    }

    #[test]
    fn test_paginated_response_decodes() {
        let json = r#"{"data":[],"total":23,"page":1,"page_size":10,"total_pages":3}"#;
        let page: PaginatedResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_pages, 3);
        assert!(page.is_empty());
        assert_eq!(PaginatedResponse::<u8>::new(vec![], 23, 1, 10).total_pages, 3);
    }
}
