#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use marquee_core::retry::RetryPolicy;
use marquee_db::MemoryCatalogStore;
use marquee_storage::LocalBlobStore;
use tower::ServiceExt;

use marquee_api::config::{ServerConfig, StorageBackend, StorageConfig};
use marquee_api::router::build_app_router;
use marquee_api::state::AppState;

pub const MEDIA_BASE_URL: &str = "http://localhost:3000/media";

/// Build a test `ServerConfig` with safe defaults, storing blobs in `root`.
pub fn test_config(root: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        database_url: None,
        storage: StorageConfig {
            backend: StorageBackend::Local,
            root,
            public_base_url: MEDIA_BASE_URL.to_string(),
            s3_bucket_prefix: "marquee-".to_string(),
            s3_public_base_url: None,
        },
        retry: RetryPolicy::none(),
    }
}

/// A router over an empty in-memory catalog and a temp-dir blob store.
///
/// Keep the `TestApp` alive for the whole test: dropping it removes the
/// blob directory.
pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<MemoryCatalogStore>,
    pub media: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_catalog(MemoryCatalogStore::new())
    }

    pub fn with_catalog(catalog: MemoryCatalogStore) -> Self {
        let media = tempfile::tempdir().expect("temp dir");
        let config = test_config(media.path().to_path_buf());
        let catalog = Arc::new(catalog);

        let state = AppState {
            catalog: catalog.clone(),
            blobs: Arc::new(LocalBlobStore::new(
                media.path(),
                config.storage.public_base_url.clone(),
            )),
            config: Arc::new(config.clone()),
        };

        Self {
            router: build_app_router(state, &config),
            catalog,
            media,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, json: serde_json::Value) -> Response {
        self.json(Method::POST, uri, json).await
    }

    pub async fn put_json(&self, uri: &str, json: serde_json::Value) -> Response {
        self.json(Method::PUT, uri, json).await
    }

    async fn json(&self, method: Method, uri: &str, json: serde_json::Value) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, parts: &[Part<'_>]) -> Response {
        self.form(Method::POST, uri, parts).await
    }

    pub async fn put_form(&self, uri: &str, parts: &[Part<'_>]) -> Response {
        self.form(Method::PUT, uri, parts).await
    }

    async fn form(&self, method: Method, uri: &str, parts: &[Part<'_>]) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    /// Path on disk of a blob saved under `container`, given its URL.
    pub fn blob_path(&self, container: &str, url: &str) -> PathBuf {
        let name = url.rsplit('/').next().unwrap();
        self.media.path().join(container).join(name)
    }

    /// Number of files stored in `container`.
    pub fn blob_count(&self, container: &str) -> usize {
        std::fs::read_dir(self.media.path().join(container))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "marquee-test-boundary";

/// One part of a `multipart/form-data` body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
    Part::Text(name, value)
}

pub fn image<'a>(name: &'a str, file_name: &'a str, bytes: &'a [u8]) -> Part<'a> {
    Part::File {
        name,
        file_name,
        content_type: "image/jpeg",
        bytes,
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Read the full response body as bytes.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Read the full response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// The `x-total-count` header as a number.
pub fn total_count(response: &Response) -> i64 {
    response
        .headers()
        .get("x-total-count")
        .expect("x-total-count header")
        .to_str()
        .unwrap()
        .parse()
        .unwrap()
}

pub fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
