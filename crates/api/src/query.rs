//! Shared query parameter types for API handlers.

use marquee_core::pagination::PageRequest;
use serde::Deserialize;

/// Pagination parameters (`?page=&pageSize=`).
///
/// Defaults and the page size cap are applied by [`PageRequest::new`].
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<i64>,
}

impl PaginationParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}
