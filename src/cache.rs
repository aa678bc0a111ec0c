//! Client-side paging over the filtered call list.

use crate::service::CallRecord;

/// Caller number the service reports when the number is unknown.
pub const UNKNOWN_NUMBER: &str = "N/A";

/// Numbers this short are internal extensions, not external callers.
pub const EXTENSION_MAX_LEN: usize = 4;

/// True when the record has a usable external caller number.
pub fn is_external_call(record: &CallRecord) -> bool {
    match record.phone_number.as_deref() {
        Some(phone) => phone != UNKNOWN_NUMBER && phone.chars().count() > EXTENSION_MAX_LEN,
        None => false,
    }
}

/// Keep only external calls, preserving order.
pub fn filter_external(records: Vec<CallRecord>) -> Vec<CallRecord> {
    records.into_iter().filter(is_external_call).collect()
}

/// Last fetched call list, filtered once on ingestion, with a current page.
#[derive(Debug, Clone, Default)]
pub struct PaginatedListCache {
    records: Vec<CallRecord>,
    page: usize,
    page_size: usize,
}

impl PaginatedListCache {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            page: 0,
            page_size,
        }
    }

    /// Replace the record set. Always returns to the first page.
    pub fn set_records(&mut self, records: Vec<CallRecord>) {
        self.records = filter_external(records);
        self.page = 0;
    }

    /// Records on page `index` with `size` rows per page.
    ///
    /// Pages past the end, and pages of size 0, are empty.
    pub fn page(&self, index: usize, size: usize) -> &[CallRecord] {
        let start = match index.checked_mul(size) {
            Some(start) if start < self.records.len() => start,
            _ => return &[],
        };
        let end = start.saturating_add(size).min(self.records.len());
        &self.records[start..end]
    }

    /// Records on the current page at the current page size.
    pub fn current_page(&self) -> &[CallRecord] {
        self.page(self.page, self.page_size)
    }

    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page(&mut self, index: usize) {
        self.page = index;
    }

    /// Change the rows per page. Returns to the first page.
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size;
        self.page = 0;
    }

    /// Number of pages at the current page size.
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.records.len().div_ceil(self.page_size)
    }

    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
