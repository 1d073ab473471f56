use std::path::PathBuf;
use std::time::Duration;

use marquee_core::retry::RetryPolicy;

/// Where uploaded posters and photos are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files under `STORAGE_ROOT`, served at `/media`.
    Local,
    /// One S3 bucket per container.
    S3,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            other => Err(format!("unknown storage backend '{other}' (expected local or s3)")),
        }
    }
}

/// Blob storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory of the local backend.
    pub root: PathBuf,
    /// URL prefix under which the local backend's files are reachable.
    pub public_base_url: String,
    /// Bucket name prefix of the S3 backend.
    pub s3_bucket_prefix: String,
    /// Overrides the virtual-hosted S3 URL (e.g. for MinIO).
    pub s3_public_base_url: Option<String>,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. Without
/// `DATABASE_URL` the server runs on an in-memory catalog.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body, uploads included.
    pub max_upload_bytes: usize,
    pub database_url: Option<String>,
    pub storage: StorageConfig,
    /// Backoff for transient catalog and blob store failures.
    pub retry: RetryPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                        |
    /// |--------------------------|--------------------------------|
    /// | `HOST`                   | `0.0.0.0`                      |
    /// | `PORT`                   | `3000`                         |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`        |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                           |
    /// | `MAX_UPLOAD_BYTES`       | `10485760`                     |
    /// | `DATABASE_URL`           | unset (in-memory catalog)      |
    /// | `STORAGE_BACKEND`        | `local`                        |
    /// | `STORAGE_ROOT`           | `storage/media`                |
    /// | `PUBLIC_BASE_URL`        | `http://localhost:3000/media`  |
    /// | `S3_BUCKET_PREFIX`       | `marquee-`                     |
    /// | `S3_PUBLIC_BASE_URL`     | unset                          |
    /// | `RETRY_MAX_ATTEMPTS`     | `3`                            |
    /// | `RETRY_INITIAL_DELAY_MS` | `100`                          |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "10485760".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let backend: StorageBackend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".into())
            .parse()
            .unwrap_or_else(|e| panic!("Invalid STORAGE_BACKEND: {e}"));

        let storage = StorageConfig {
            backend,
            root: std::env::var("STORAGE_ROOT")
                .unwrap_or_else(|_| "storage/media".into())
                .into(),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/media".into()),
            s3_bucket_prefix: std::env::var("S3_BUCKET_PREFIX")
                .unwrap_or_else(|_| "marquee-".into()),
            s3_public_base_url: std::env::var("S3_PUBLIC_BASE_URL").ok(),
        };

        let max_attempts: u32 = std::env::var("RETRY_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("RETRY_MAX_ATTEMPTS must be a valid u32");

        let initial_delay_ms: u64 = std::env::var("RETRY_INITIAL_DELAY_MS")
            .unwrap_or_else(|_| "100".into())
            .parse()
            .expect("RETRY_INITIAL_DELAY_MS must be a valid u64");

        let retry = RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(initial_delay_ms),
            ..RetryPolicy::default()
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            database_url,
            storage,
            retry,
        }
    }
}
