//! Shared response types for API handlers.

use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use marquee_core::pagination::Page;
use serde::Serialize;

/// Header carrying the size of the full candidate set of a list response.
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// A page of items: the items as a JSON array, the total in
/// [`TOTAL_COUNT_HEADER`].
#[derive(Debug)]
pub struct Paginated<T>(pub Page<T>);

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        let Page { items, total_count } = self.0;
        (
            [(TOTAL_COUNT_HEADER, HeaderValue::from(total_count))],
            Json(items),
        )
            .into_response()
    }
}
