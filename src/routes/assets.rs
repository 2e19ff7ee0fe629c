use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::asset::{Asset, AssetChanges, AssetPage, AssetStatus, AssetStatusReport, AssetUrls};
use crate::models::requests::{
    AssetUrlQuery, ListAssetsQuery, MessageResponse, UpdateAssetRequest, UpdateStatusRequest,
};
use crate::routes::read_upload;
use crate::services::validation::parse_id;

/// POST /api/assets: upload a media file (multipart fields `file`, optional `name`).
pub async fn create_asset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<Asset>)> {
    let mut upload = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => upload = Some(read_upload(field).await?),
            Some("name") => name = Some(field.text().await?),
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::invalid("No file provided"))?;
    let asset = state
        .assets
        .create_with_upload(upload, name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(asset)))
}

/// GET /api/assets
pub async fn list_assets(
    State(state): State<AppState>,
    Query(query): Query<ListAssetsQuery>,
) -> AppResult<Json<AssetPage>> {
    let page = state.assets.list(query.limit, query.offset).await?;
    Ok(Json(page))
}

/// GET /api/assets/{id}
pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Asset>> {
    let id = parse_id(&id, "asset")?;
    Ok(Json(state.assets.get_by_id(id).await?))
}

/// GET /api/assets/{id}/url?expiration=<minutes>
pub async fn get_asset_urls(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AssetUrlQuery>,
) -> AppResult<Json<AssetUrls>> {
    let id = parse_id(&id, "asset")?;
    Ok(Json(state.assets.get_urls(id, query.expiration).await?))
}

/// GET /api/assets/{id}/status: probe for processed output.
pub async fn get_asset_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AssetStatusReport>> {
    let id = parse_id(&id, "asset")?;
    Ok(Json(state.assets.refresh_status(id).await?))
}

/// PUT /api/assets/{id}
pub async fn update_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateAssetRequest>, JsonRejection>,
) -> AppResult<Json<Asset>> {
    let id = parse_id(&id, "asset")?;
    let Json(req) = body?;
    req.validate()?;

    let status = req
        .status
        .parse::<AssetStatus>()
        .map_err(|_| AppError::invalid("invalid status: must be 'uploaded' or 'processed'"))?;

    let changes = AssetChanges {
        file_name: req.file_name,
        file_size: req.file_size,
        content_type: req.content_type,
        input_key: req.s3_key,
        output_key: req.output_s3_key,
        bucket: req.s3_bucket,
        status,
    };

    Ok(Json(state.assets.update(id, changes).await?))
}

/// PATCH /api/assets/{id}/status
pub async fn update_asset_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AppResult<Json<Asset>> {
    let id = parse_id(&id, "asset")?;
    let Json(req) = body?;
    req.validate()?;

    let asset = state
        .assets
        .update_status(id, &req.status, req.output_s3_key.as_deref())
        .await?;
    Ok(Json(asset))
}

/// DELETE /api/assets/{id}
pub async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(&id, "asset")?;
    state.assets.delete(id).await?;
    Ok(Json(MessageResponse::new("Asset deleted successfully")))
}
