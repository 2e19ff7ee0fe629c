//! Persistence seams used by the managers.
//!
//! Every read excludes soft-deleted rows (`deleted_at IS NOT NULL`).

use async_trait::async_trait;

use super::DbError;
use crate::models::asset::{Asset, AssetChanges, AssetStatus, NewAsset};
use crate::models::task::{NewTask, Task, TaskInsert, TaskWithAsset};
use crate::models::template::{NewTemplate, Template};

#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn create(&self, asset: NewAsset) -> Result<Asset, DbError>;

    /// `DbError::NotFound` when absent or soft-deleted.
    async fn get_by_id(&self, id: i64) -> Result<Asset, DbError>;

    /// Newest first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Asset>, DbError>;

    async fn count(&self) -> Result<i64, DbError>;

    async fn update(&self, id: i64, changes: AssetChanges) -> Result<Asset, DbError>;

    /// Set the status, stamping `processed_at` on entry to `processed` and
    /// clearing it on return to `uploaded`. `output_key` is only written
    /// when given.
    async fn update_status(
        &self,
        id: i64,
        status: AssetStatus,
        output_key: Option<&str>,
    ) -> Result<Asset, DbError>;

    async fn soft_delete(&self, id: i64) -> Result<(), DbError>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn create(&self, template: NewTemplate) -> Result<Template, DbError>;

    async fn list(&self) -> Result<Vec<Template>, DbError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert unless a live task already binds the same asset and template.
    async fn insert_if_absent(&self, task: NewTask) -> Result<TaskInsert, DbError>;

    /// Load a task and its live asset.
    async fn get_with_asset(&self, id: i64) -> Result<TaskWithAsset, DbError>;

    /// Replace the stored metadata document and, when `output_key` is given,
    /// record it on the task's asset. Both writes land or neither does;
    /// `DbError::NotFound` when the task or its live asset is gone.
    async fn record_result(
        &self,
        id: i64,
        metadata: serde_json::Value,
        output_key: Option<&str>,
    ) -> Result<Task, DbError>;
}
