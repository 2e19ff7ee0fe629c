use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::asset_queries::asset_from_row;
use super::repository::TaskRepository;
use super::DbError;
use crate::models::task::{NewTask, Task, TaskInsert, TaskWithAsset};

/// Task persistence over the `task_metadata` table.
#[derive(Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn task_from_row(row: &PgRow) -> Result<Task, sqlx::Error> {
    Ok(Task {
        id: row.try_get("id")?,
        template_id: row.try_get("template_id")?,
        asset_id: row.try_get("asset_id")?,
        metadata: row.try_get("metadata")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn insert_if_absent(&self, task: NewTask) -> Result<TaskInsert, DbError> {
        // The partial unique index arbitrates concurrent inserts for one pair.
        let row = sqlx::query(
            r#"
            INSERT INTO task_metadata (template_id, asset_id, metadata)
            VALUES ($1, $2, $3)
            ON CONFLICT (asset_id, template_id) WHERE deleted_at IS NULL DO NOTHING
            RETURNING id, template_id, asset_id, metadata, created_at, updated_at, deleted_at
            "#,
        )
        .bind(task.template_id)
        .bind(task.asset_id)
        .bind(&task.metadata)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(TaskInsert::Created(task_from_row(&row)?)),
            None => Ok(TaskInsert::AlreadyExists),
        }
    }

    async fn get_with_asset(&self, id: i64) -> Result<TaskWithAsset, DbError> {
        let row = sqlx::query(
            r#"
            SELECT t.id AS task_id, t.template_id, t.asset_id, t.metadata,
                   t.created_at AS task_created_at, t.updated_at AS task_updated_at,
                   a.id, a.file_name, a.file_size, a.content_type, a.s3_key, a.output_s3_key,
                   a.s3_bucket, a.status, a.uploaded_at, a.processed_at,
                   a.created_at, a.updated_at, a.deleted_at
            FROM task_metadata t
            JOIN asset_metadata a ON a.id = t.asset_id AND a.deleted_at IS NULL
            WHERE t.id = $1 AND t.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        let task = Task {
            id: row.try_get("task_id")?,
            template_id: row.try_get("template_id")?,
            asset_id: row.try_get("asset_id")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("task_created_at")?,
            updated_at: row.try_get("task_updated_at")?,
            deleted_at: None,
        };
        let asset = asset_from_row(&row)?;

        Ok(TaskWithAsset { task, asset })
    }

    async fn record_result(
        &self,
        id: i64,
        metadata: serde_json::Value,
        output_key: Option<&str>,
    ) -> Result<Task, DbError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE task_metadata
            SET metadata = $1, updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL
            RETURNING id, template_id, asset_id, metadata, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&metadata)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;
        let task = task_from_row(&row)?;

        if let Some(output_key) = output_key {
            let result = sqlx::query(
                r#"
                UPDATE asset_metadata
                SET output_s3_key = $1, updated_at = NOW()
                WHERE id = $2 AND deleted_at IS NULL
                "#,
            )
            .bind(output_key)
            .bind(task.asset_id)
            .execute(&mut *tx)
            .await?;

            // Dropping the transaction rolls back the metadata write.
            if result.rows_affected() == 0 {
                return Err(DbError::NotFound);
            }
        }

        tx.commit().await?;
        Ok(task)
    }
}
