use chrono::Utc;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::db::{AssetRepository, DbError};
use crate::error::{AppError, AppResult};
use crate::models::asset::{
    Asset, AssetChanges, AssetPage, AssetStatus, AssetStatusReport, AssetUrls, NewAsset,
};
use crate::services::storage::ObjectStore;
use crate::services::validation;

/// A file received from a client, before it is stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub data: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
    pub declared_size: i64,
}

/// Owns the asset lifecycle: upload, status transitions and link generation.
pub struct AssetManager {
    repo: Arc<dyn AssetRepository>,
    store: Arc<dyn ObjectStore>,
}

impl AssetManager {
    pub fn new(repo: Arc<dyn AssetRepository>, store: Arc<dyn ObjectStore>) -> Self {
        Self { repo, store }
    }

    /// Upload the file under `input/` and record it with status `uploaded`.
    ///
    /// Size and content type are checked before anything is sent to the
    /// object store. If the row cannot be inserted the uploaded object is
    /// removed again on a best-effort basis.
    pub async fn create_with_upload(
        &self,
        upload: Upload,
        custom_name: Option<&str>,
    ) -> AppResult<Asset> {
        if upload.declared_size <= 0 {
            return Err(AppError::invalid("file is empty"));
        }
        if !validation::is_allowed_content_type(&upload.content_type) {
            return Err(AppError::invalid(
                "invalid file type: only images and videos are allowed",
            ));
        }

        let custom_name = custom_name.map(str::trim).filter(|n| !n.is_empty());
        let key = validation::object_key(
            validation::INPUT_NAMESPACE,
            custom_name,
            &upload.file_name,
            Utc::now(),
        );

        self.store
            .put(&key, &upload.data, &upload.content_type)
            .await?;

        let new_asset = NewAsset {
            file_name: custom_name.unwrap_or(&upload.file_name).to_string(),
            file_size: upload.declared_size,
            content_type: upload.content_type,
            input_key: key.clone(),
            bucket: self.store.bucket().to_string(),
        };

        match self.repo.create(new_asset).await {
            Ok(asset) => {
                metrics::counter!("assets_uploaded_total").increment(1);
                tracing::info!(asset_id = asset.id, key = %asset.input_key, "Asset uploaded");
                Ok(asset)
            }
            Err(e) => {
                metrics::counter!("asset_upload_rollbacks_total").increment(1);
                if let Err(cleanup) = self.store.delete(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(e.into())
            }
        }
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: &str,
        output_key: Option<&str>,
    ) -> AppResult<Asset> {
        let status = AssetStatus::from_str(status).map_err(|_| {
            AppError::invalid("invalid status: must be 'uploaded' or 'processed'")
        })?;

        self.get_by_id(id).await?;

        let asset = self
            .repo
            .update_status(id, status, output_key)
            .await
            .map_err(not_found_as_asset)?;
        tracing::info!(asset_id = id, status = %status, "Asset status updated");
        Ok(asset)
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Asset> {
        self.repo.get_by_id(id).await.map_err(not_found_as_asset)
    }

    /// One page of live assets plus the overall count.
    pub async fn list(&self, limit: Option<i64>, offset: Option<i64>) -> AppResult<AssetPage> {
        let limit = validation::clamp_limit(limit);
        let offset = validation::clamp_offset(offset);

        let assets = self.repo.list(limit, offset).await?;
        let total = self.repo.count().await?;

        Ok(AssetPage {
            assets,
            total,
            limit,
            offset,
        })
    }

    pub async fn update(&self, id: i64, changes: AssetChanges) -> AppResult<Asset> {
        self.repo
            .update(id, changes)
            .await
            .map_err(not_found_as_asset)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repo.soft_delete(id).await.map_err(not_found_as_asset)?;
        tracing::info!(asset_id = id, "Asset deleted");
        Ok(())
    }

    /// Presigned GET links for the input object and, when recorded, the output.
    pub async fn get_urls(&self, id: i64, ttl_minutes: Option<i64>) -> AppResult<AssetUrls> {
        let asset = self.get_by_id(id).await?;
        // Clamped to seven days, so the multiplication cannot overflow.
        let minutes = validation::ttl_minutes(ttl_minutes).unsigned_abs();
        let ttl = Duration::from_secs(minutes.saturating_mul(60));

        let input_url = self.store.presign(&asset.input_key, ttl).await?;
        let output_url = match asset.output_key.as_deref() {
            Some(key) if !key.is_empty() => Some(self.store.presign(key, ttl).await?),
            _ => None,
        };

        Ok(AssetUrls {
            input_url,
            output_url,
            expires_in: ttl.as_secs(),
        })
    }

    /// Promote an `uploaded` asset to `processed` once its recorded output
    /// object is present in the store.
    pub async fn refresh_status(&self, id: i64) -> AppResult<AssetStatusReport> {
        let mut asset = self.get_by_id(id).await?;

        if asset.status == AssetStatus::Uploaded {
            if let Some(output_key) = asset.output_key.clone().filter(|k| !k.is_empty()) {
                match self.store.exists(&output_key).await {
                    Ok(true) => {
                        asset = self
                            .repo
                            .update_status(id, AssetStatus::Processed, None)
                            .await
                            .map_err(not_found_as_asset)?;
                        tracing::info!(asset_id = id, "Processed output found, asset promoted");
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(asset_id = id, error = %e, "Could not probe processed output");
                    }
                }
            }
        }

        let ttl = Duration::from_secs(validation::DEFAULT_URL_TTL_MINUTES as u64 * 60);
        let file_url = self
            .store
            .presign(&asset.input_key, ttl)
            .await
            .unwrap_or_default();

        Ok(AssetStatusReport {
            status: asset.status,
            file_url,
            message: format!("Asset {} is {}", asset.file_name, asset.status),
        })
    }
}

fn not_found_as_asset(err: DbError) -> AppError {
    match err {
        DbError::NotFound => AppError::not_found("Asset"),
        other => other.into(),
    }
}
