//! Page-based pagination contract shared by every list endpoint.
//!
//! A [`PageRequest`] is 1-based and its page size is clamped to
//! [`MAX_PAGE_SIZE`]. A [`Page`] carries the requested slice together with
//! the size of the whole candidate set, so callers can compute page counts.

use serde::Serialize;

/// Page used when the caller does not ask for one.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Requests above this page size are silently reduced to it.
pub const MAX_PAGE_SIZE: i64 = 50;

/// A normalized page request. Construct with [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Normalize raw query values.
    ///
    /// - `page` defaults to 1; values below 1 are treated as 1.
    /// - `page_size` defaults to 10, is capped at 50, and is at least 1.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(DEFAULT_PAGE).max(1);
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    /// Effective page size after clamping.
    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// SQL `LIMIT` for this page.
    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// SQL `OFFSET` for this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the size of the full candidate set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

impl<T> Page<T> {
    /// Convert every item, keeping the total count.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }
}

/// Slice an already-ordered candidate sequence.
///
/// No ordering is imposed here: callers must pass candidates in a
/// deterministic order so pages are stable. Pages past the end are empty.
pub fn paginate<T>(candidates: impl IntoIterator<Item = T>, request: PageRequest) -> Page<T> {
    let candidates: Vec<T> = candidates.into_iter().collect();
    let total_count = candidates.len() as i64;
    let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(request.limit()).unwrap_or(0);

    let items = candidates.into_iter().skip(skip).take(take).collect();
    Page { items, total_count }
}
