//! Filesystem blob backend.
//!
//! A container is a sub-directory of `root`, created on first save. Files
//! are public through whatever serves `root` at `public_base_url`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use marquee_core::blob::{blob_name, generate_blob_name, BlobStore};
use marquee_core::error::CoreError;

#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, CoreError> {
        if container.is_empty() || container.contains(['/', '\\']) || container.starts_with('.') {
            return Err(CoreError::Internal(format!(
                "Invalid blob container name: {container:?}"
            )));
        }
        Ok(self.root.join(container))
    }
}

fn io_error(context: &str, err: std::io::Error) -> CoreError {
    let message = format!("{context}: {err}");
    match err.kind() {
        ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock => {
            CoreError::transient(message)
        }
        _ => CoreError::storage(message),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(
        &self,
        container: &str,
        bytes: &[u8],
        extension: &str,
        _content_type: Option<&str>,
    ) -> Result<String, CoreError> {
        let dir = self.container_dir(container)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("Failed to create blob container", e))?;

        let name = generate_blob_name(extension);
        tokio::fs::write(dir.join(&name), bytes)
            .await
            .map_err(|e| io_error("Failed to write blob", e))?;

        tracing::info!(container, blob = %name, size = bytes.len(), "Saved blob");
        Ok(format!("{}/{container}/{name}", self.public_base_url))
    }

    async fn delete(&self, container: &str, url_or_path: &str) -> Result<(), CoreError> {
        let name = blob_name(url_or_path.trim());
        if name.is_empty() || name == "." || name == ".." {
            return Ok(());
        }

        let path = self.container_dir(container)?.join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(container, blob = %name, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("Failed to delete blob", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use marquee_core::blob::{Upload, POSTERS_CONTAINER};

    use super::*;

    fn store(dir: &tempfile::TempDir) -> LocalBlobStore {
        LocalBlobStore::new(dir.path(), "http://localhost:3000/media/")
    }

    fn stored_path(dir: &tempfile::TempDir, url: &str) -> PathBuf {
        dir.path().join(POSTERS_CONTAINER).join(blob_name(url))
    }

    #[tokio::test]
    async fn save_uses_generated_name_and_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let url = store(&dir)
            .save(POSTERS_CONTAINER, b"img", ".png", Some("image/png"))
            .await
            .unwrap();

        assert!(url.starts_with("http://localhost:3000/media/movies/"));
        assert!(url.ends_with(".png"));
        assert!(!url.contains("poster"));
        assert_eq!(std::fs::read(stored_path(&dir, &url)).unwrap(), b"img");
    }

    #[tokio::test]
    async fn two_saves_never_share_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let a = store.save(POSTERS_CONTAINER, b"a", ".jpg", None).await.unwrap();
        let b = store.save(POSTERS_CONTAINER, b"b", ".jpg", None).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let url = store.save(POSTERS_CONTAINER, b"a", ".jpg", None).await.unwrap();

        store.delete(POSTERS_CONTAINER, &url).await.unwrap();
        assert!(!stored_path(&dir, &url).exists());
        store.delete(POSTERS_CONTAINER, &url).await.unwrap();
        store.delete(POSTERS_CONTAINER, "").await.unwrap();
        store.delete("never-created", "x.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn replace_removes_old_and_stores_new() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let old = store.save(POSTERS_CONTAINER, b"old", ".jpg", None).await.unwrap();

        let upload = Upload {
            file_name: "new poster.webp".into(),
            content_type: None,
            bytes: b"new".to_vec(),
        };
        let new = store
            .replace(POSTERS_CONTAINER, &upload, Some(&old))
            .await
            .unwrap();

        assert!(!stored_path(&dir, &old).exists());
        assert_eq!(std::fs::read(stored_path(&dir, &new)).unwrap(), b"new");
        assert!(new.ends_with(".webp"));
    }

    #[tokio::test]
    async fn container_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = store(&dir).save("../outside", b"x", "", None).await;
        assert_matches!(result, Err(CoreError::Internal(_)));
    }
}
