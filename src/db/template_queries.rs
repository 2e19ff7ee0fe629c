use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::repository::TemplateRepository;
use super::DbError;
use crate::models::template::{NewTemplate, Template};

/// Template persistence over the `template_metadata` table.
#[derive(Clone)]
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn template_from_row(row: &PgRow) -> Result<Template, sqlx::Error> {
    Ok(Template {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        key: row.try_get("s3_key")?,
        bucket: row.try_get("s3_bucket")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn create(&self, template: NewTemplate) -> Result<Template, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO template_metadata (name, s3_key, s3_bucket)
            VALUES ($1, $2, $3)
            RETURNING id, name, s3_key, s3_bucket, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&template.name)
        .bind(&template.key)
        .bind(&template.bucket)
        .fetch_one(&self.pool)
        .await?;

        Ok(template_from_row(&row)?)
    }

    async fn list(&self) -> Result<Vec<Template>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, s3_key, s3_bucket, created_at, updated_at, deleted_at
            FROM template_metadata
            WHERE deleted_at IS NULL
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| template_from_row(r).map_err(DbError::from))
            .collect()
    }
}
