use crate::models::PaginatedResponse;
use std::fmt;

/// ceil(total / page_size); zero when there is nothing to show
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
}

/// Row range and navigation state of the page being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    /// 1-based index of the first row shown, 0 when empty
    pub first_row: u64,
    /// 1-based index of the last row shown, 0 when empty
    pub last_row: u64,
}

impl PageSummary {
    pub fn new(page: u32, page_size: u32, total: u64) -> Self {
        let page = page.max(1);
        let total_pages = total_pages(total, page_size);
        let start = u64::from(page - 1) * u64::from(page_size);

        let (first_row, last_row) = if total == 0 || start >= total {
            (0, 0)
        } else {
            (start + 1, (start + u64::from(page_size)).min(total))
        };

        Self {
            page,
            page_size,
            total,
            total_pages,
            first_row,
            last_row,
        }
    }

    pub fn from_response<T>(response: &PaginatedResponse<T>) -> Self {
        Self::new(response.page, response.page_size, response.total)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Page numbers to offer in a pager, at most `width` of them, centred on
    /// the current page where possible
    pub fn page_window(&self, width: u32) -> Vec<u32> {
        if self.total_pages == 0 || width == 0 {
            return Vec::new();
        }

        let width = width.min(self.total_pages);
        let current = self.page.min(self.total_pages);
        let start = current
            .saturating_sub(width / 2)
            .max(1)
            .min(self.total_pages - width + 1);

        (start..start + width).collect()
    }
}

impl fmt::Display for PageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Showing {} to {} of {} results",
            self.first_row, self.last_row, self.total
        )
    }
}
