//! Binary asset (poster / photo) storage port.
//!
//! Backends implement [`BlobStore::save`] and [`BlobStore::delete`];
//! [`BlobStore::replace`] composes the two. Blob names are always a fresh
//! random identifier plus the original extension, never the uploaded
//! file name.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::retry::{with_retry, RetryPolicy};

/// Container holding movie posters.
pub const POSTERS_CONTAINER: &str = "movies";

/// Container holding actor photos.
pub const PHOTOS_CONTAINER: &str = "actors";

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// File name supplied by the client. Only its extension is kept.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Extension of the client file name, including the leading dot.
    pub fn extension(&self) -> String {
        file_extension(&self.file_name)
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` in `container` and return the public URL of the blob.
    ///
    /// Creates the container when missing and makes it publicly readable.
    /// `extension` (e.g. `".jpg"`, or empty) is appended to a generated name.
    async fn save(
        &self,
        container: &str,
        bytes: &[u8],
        extension: &str,
        content_type: Option<&str>,
    ) -> Result<String, CoreError>;

    /// Remove the blob addressed by `url_or_path` from `container`.
    ///
    /// Idempotent: an empty reference or an already-absent blob succeeds.
    async fn delete(&self, container: &str, url_or_path: &str) -> Result<(), CoreError>;

    /// Delete `old`, then save `upload`, returning the new URL.
    ///
    /// The two steps are not transactional: if the save fails, the old blob
    /// is already gone and no new blob exists. Callers that need the old
    /// asset to survive a failed upload should save first, commit the record
    /// pointing at the new URL, and only then delete the old blob.
    async fn replace(
        &self,
        container: &str,
        upload: &Upload,
        old: Option<&str>,
    ) -> Result<String, CoreError> {
        if let Some(old) = old {
            self.delete(container, old).await?;
        }
        self.save(
            container,
            &upload.bytes,
            &upload.extension(),
            upload.content_type.as_deref(),
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Naming helpers
// ---------------------------------------------------------------------------

/// Extension of `file_name` including the dot, or empty when there is none.
///
/// Only the final path segment is considered, so `"dir.v2/poster"` has no
/// extension while `"poster.final.PNG"` yields `".PNG"`.
pub fn file_extension(file_name: &str) -> String {
    let name = blob_name(file_name);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name[idx..].to_string(),
        _ => String::new(),
    }
}

/// A fresh, collision-free blob name with the given extension.
pub fn generate_blob_name(extension: &str) -> String {
    format!("{}{extension}", uuid::Uuid::new_v4())
}

/// Last path segment of a URL or path, ignoring any query string.
pub fn blob_name(url_or_path: &str) -> &str {
    let without_query = url_or_path
        .split(['?', '#'])
        .next()
        .unwrap_or(url_or_path);
    without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query)
}

// ---------------------------------------------------------------------------
// Retry decorator
// ---------------------------------------------------------------------------

/// Wraps a [`BlobStore`] and retries its transient failures.
pub struct RetryingBlobStore {
    inner: Arc<dyn BlobStore>,
    policy: RetryPolicy,
}

impl RetryingBlobStore {
    pub fn new(inner: Arc<dyn BlobStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl BlobStore for RetryingBlobStore {
    async fn save(
        &self,
        container: &str,
        bytes: &[u8],
        extension: &str,
        content_type: Option<&str>,
    ) -> Result<String, CoreError> {
        let inner = &self.inner;
        with_retry(&self.policy, "blob.save", move || {
            inner.save(container, bytes, extension, content_type)
        })
        .await
    }

    async fn delete(&self, container: &str, url_or_path: &str) -> Result<(), CoreError> {
        let inner = &self.inner;
        with_retry(&self.policy, "blob.delete", move || {
            inner.delete(container, url_or_path)
        })
        .await
    }
}
