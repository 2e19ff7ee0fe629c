use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;

use super::repository::AssetRepository;
use super::DbError;
use crate::models::asset::{Asset, AssetChanges, AssetStatus, NewAsset};

const ASSET_COLUMNS: &str = r#"
    id, file_name, file_size, content_type, s3_key, output_s3_key, s3_bucket,
    status, uploaded_at, processed_at, created_at, updated_at, deleted_at
"#;

/// Asset persistence over the `asset_metadata` table.
#[derive(Clone)]
pub struct PgAssetRepository {
    pool: PgPool,
}

impl PgAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn asset_from_row(row: &PgRow) -> Result<Asset, sqlx::Error> {
    let status_str: String = row.try_get("status")?;
    let status =
        AssetStatus::from_str(&status_str).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Asset {
        id: row.try_get("id")?,
        file_name: row.try_get("file_name")?,
        file_size: row.try_get("file_size")?,
        content_type: row.try_get("content_type")?,
        input_key: row.try_get("s3_key")?,
        output_key: row.try_get("output_s3_key")?,
        bucket: row.try_get("s3_bucket")?,
        status,
        uploaded_at: row.try_get("uploaded_at")?,
        processed_at: row.try_get("processed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    async fn create(&self, asset: NewAsset) -> Result<Asset, DbError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO asset_metadata (file_name, file_size, content_type, s3_key, s3_bucket, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(&asset.file_name)
        .bind(asset.file_size)
        .bind(&asset.content_type)
        .bind(&asset.input_key)
        .bind(&asset.bucket)
        .bind(AssetStatus::Uploaded.as_ref())
        .fetch_one(&self.pool)
        .await?;

        Ok(asset_from_row(&row)?)
    }

    async fn get_by_id(&self, id: i64) -> Result<Asset, DbError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {ASSET_COLUMNS}
            FROM asset_metadata
            WHERE id = $1 AND deleted_at IS NULL
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(asset_from_row(&row)?)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Asset>, DbError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ASSET_COLUMNS}
            FROM asset_metadata
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| asset_from_row(r).map_err(DbError::from))
            .collect()
    }

    async fn count(&self) -> Result<i64, DbError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM asset_metadata WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("total")?)
    }

    async fn update(&self, id: i64, changes: AssetChanges) -> Result<Asset, DbError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE asset_metadata
            SET file_name = $1,
                file_size = $2,
                content_type = $3,
                s3_key = $4,
                output_s3_key = $5,
                s3_bucket = $6,
                status = $7,
                processed_at = CASE
                    WHEN $7 = 'processed' THEN COALESCE(processed_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $8 AND deleted_at IS NULL
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(&changes.file_name)
        .bind(changes.file_size)
        .bind(&changes.content_type)
        .bind(&changes.input_key)
        .bind(&changes.output_key)
        .bind(&changes.bucket)
        .bind(changes.status.as_ref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(asset_from_row(&row)?)
    }

    async fn update_status(
        &self,
        id: i64,
        status: AssetStatus,
        output_key: Option<&str>,
    ) -> Result<Asset, DbError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE asset_metadata
            SET status = $1,
                output_s3_key = COALESCE($2, output_s3_key),
                processed_at = CASE
                    WHEN $1 = 'processed' THEN COALESCE(processed_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING {ASSET_COLUMNS}
            "#
        ))
        .bind(status.as_ref())
        .bind(output_key)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(asset_from_row(&row)?)
    }

    async fn soft_delete(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE asset_metadata
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
