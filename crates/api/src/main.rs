use std::net::SocketAddr;
use std::sync::Arc;

use marquee_core::blob::{BlobStore, RetryingBlobStore};
use marquee_db::{CatalogStore, MemoryCatalogStore, PgCatalogStore};
use marquee_storage::{LocalBlobStore, S3BlobStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_api::config::{ServerConfig, StorageBackend};
use marquee_api::router::build_app_router;
use marquee_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "marquee_api=debug,marquee_db=debug,marquee_storage=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Catalog ---
    let catalog: Arc<dyn CatalogStore> = match &config.database_url {
        Some(database_url) => {
            let pool = marquee_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            marquee_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            marquee_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgCatalogStore::new(pool, config.retry.clone()))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory catalog");
            Arc::new(MemoryCatalogStore::with_demo_genres())
        }
    };

    // --- Blob storage ---
    let backend: Arc<dyn BlobStore> = match config.storage.backend {
        StorageBackend::Local => {
            tracing::info!(root = %config.storage.root.display(), "Using local blob storage");
            Arc::new(LocalBlobStore::new(
                config.storage.root.clone(),
                config.storage.public_base_url.clone(),
            ))
        }
        StorageBackend::S3 => {
            tracing::info!(prefix = %config.storage.s3_bucket_prefix, "Using S3 blob storage");
            Arc::new(
                S3BlobStore::from_env(
                    config.storage.s3_bucket_prefix.clone(),
                    config.storage.s3_public_base_url.clone(),
                )
                .await,
            )
        }
    };
    let blobs = Arc::new(RetryingBlobStore::new(backend, config.retry.clone()));

    // --- App state ---
    let state = AppState {
        catalog,
        blobs,
        config: Arc::new(config.clone()),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
