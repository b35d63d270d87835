use serde::{Deserialize, Serialize};

pub mod entry;

pub use entry::{Entry, EntryCreateRequest, EntryUpdateRequest, NewEntry};

/// Pagination summary returned alongside a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub limit: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Pagination {
    /// Build the summary for `page` (1-based) of a collection of `total` items
    pub fn new(total: usize, page: usize, limit: usize) -> Self {
        let total_pages = if limit > 0 { total.div_ceil(limit) } else { 0 };

        Self {
            total,
            total_pages,
            current_page: page,
            limit,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    /// Zero-based offset of the first item on the current page
    pub fn offset(&self) -> usize {
        self.current_page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// One page of the catalog listing
#[derive(Debug, Clone, Serialize)]
pub struct EntryPage {
    pub entries: Vec<Entry>,
    pub pagination: Pagination,
}

/// Result of a bulk import
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub entries: Vec<Entry>,
    pub count: usize,
}
