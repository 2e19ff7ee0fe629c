use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use screensaver_ad_backend::app_state::AppState;
use screensaver_ad_backend::config::AppConfig;
use screensaver_ad_backend::db;
use screensaver_ad_backend::routes;
use screensaver_ad_backend::services::storage::{ObjectStore, S3Storage, UnconfiguredStorage};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing screensaver-ad-backend");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!("assets_uploaded_total", "Assets uploaded and recorded");
    metrics::describe_counter!(
        "asset_upload_rollbacks_total",
        "Uploads removed again after the database insert failed"
    );
    metrics::describe_counter!("templates_created_total", "Templates registered");
    metrics::describe_counter!("tasks_created_total", "Tasks created");
    metrics::describe_counter!(
        "tasks_deduplicated_total",
        "Task requests answered by an existing task"
    );
    metrics::describe_counter!("webhook_events_total", "Webhook events received");

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let connect_options = config
        .pg_connect_options()
        .expect("Invalid database configuration");
    let db_pool = db::init_pool(connect_options)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Object storage is optional; without it uploads fail but the API still serves reads
    let store: Arc<dyn ObjectStore> = match config.storage() {
        Some(storage) => {
            tracing::info!(bucket = %storage.bucket, region = %storage.region, "Initializing S3 storage client");
            let client = S3Storage::new(
                &storage.bucket,
                &storage.region,
                storage.endpoint.as_deref(),
                &storage.access_key,
                &storage.secret_key,
            )
            .expect("Failed to initialize S3 client");
            Arc::new(client)
        }
        None => {
            tracing::warn!("S3 is not configured; upload features are disabled");
            Arc::new(UnconfiguredStorage)
        }
    };
    let storage_configured = config.storage().is_some();

    // Create shared application state
    let state = AppState::with_postgres(db_pool, store, storage_configured);

    let app = routes::build_router(state, config.max_upload_bytes())
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        );

    tracing::info!("Starting screensaver-ad-backend on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
