use std::sync::Arc;

use marquee_core::blob::BlobStore;
use marquee_db::CatalogStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Catalog persistence (Postgres or in-memory).
    pub catalog: Arc<dyn CatalogStore>,
    /// Poster and photo storage.
    pub blobs: Arc<dyn BlobStore>,
    pub config: Arc<ServerConfig>,
}
