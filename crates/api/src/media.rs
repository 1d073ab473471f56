//! Upload-first asset handling for poster and photo writes.
//!
//! A write that carries a new image runs in this order:
//!
//! 1. [`store_upload`] saves the new blob and yields its URL.
//! 2. The catalog write referencing that URL is committed.
//! 3. On success [`discard`] removes the superseded blob; on failure it
//!    removes the blob stored in step 1.
//!
//! A failed upload therefore never loses the old image, and a failed commit
//! leaves at most an orphaned new blob whose cleanup is best effort.

use marquee_core::blob::{BlobStore, Upload};

use crate::error::AppResult;

/// Save `upload` into `container`, if there is one.
pub async fn store_upload(
    blobs: &dyn BlobStore,
    container: &str,
    upload: Option<&Upload>,
) -> AppResult<Option<String>> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    let url = blobs
        .save(
            container,
            &upload.bytes,
            &upload.extension(),
            upload.content_type.as_deref(),
        )
        .await?;
    Ok(Some(url))
}

/// Delete a blob that is no longer referenced, logging instead of failing.
pub async fn discard(blobs: &dyn BlobStore, container: &str, url: Option<&str>) {
    let Some(url) = url else {
        return;
    };
    if let Err(e) = blobs.delete(container, url).await {
        tracing::warn!(container, url, error = %e, "Failed to delete unreferenced blob");
    }
}

/// Finish a write that may have stored a new blob.
///
/// On success the blob the record used to point at (`previous`) is deleted
/// when a new one replaced it. On failure the new blob is deleted.
pub async fn settle<T>(
    blobs: &dyn BlobStore,
    container: &str,
    new_url: Option<&str>,
    previous: Option<&str>,
    outcome: AppResult<T>,
) -> AppResult<T> {
    match &outcome {
        Ok(_) if new_url.is_some() => discard(blobs, container, previous).await,
        Ok(_) => {}
        Err(_) => discard(blobs, container, new_url).await,
    }
    outcome
}
