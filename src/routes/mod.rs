use axum::extract::multipart::Field;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::services::assets::Upload;

pub mod assets;
pub mod health;
pub mod metrics;
pub mod tasks;
pub mod templates;
pub mod webhook;

/// API routes with tracing, compression, CORS and a body limit of
/// `max_body_bytes`.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/assets",
            post(assets::create_asset).get(assets::list_assets),
        )
        .route(
            "/api/assets/{id}",
            get(assets::get_asset)
                .put(assets::update_asset)
                .delete(assets::delete_asset),
        )
        .route("/api/assets/{id}/url", get(assets::get_asset_urls))
        .route(
            "/api/assets/{id}/status",
            get(assets::get_asset_status).patch(assets::update_asset_status),
        )
        .route(
            "/api/templates",
            post(templates::upload_template).get(templates::list_templates),
        )
        .route("/api/tasks", post(tasks::create_task))
        .route("/webhook", post(webhook::handle_webhook))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}

/// Buffer a multipart file field.
pub(crate) async fn read_upload(field: Field<'_>) -> AppResult<Upload> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field.bytes().await?.to_vec();

    Ok(Upload {
        declared_size: data.len() as i64,
        data,
        file_name,
        content_type,
    })
}
