use serde_json::{Map, Value};
use std::sync::Arc;

use crate::db::{DbError, TaskRepository};
use crate::error::{AppError, AppResult};
use crate::models::task::{NewTask, Task, TaskInsert};
use crate::services::validation;

/// Webhook event type that carries processing results.
pub const PROCESSED_EVENT: &str = "processed";

/// Owns idempotent task creation and the webhook-driven metadata update.
pub struct TaskManager {
    repo: Arc<dyn TaskRepository>,
}

impl TaskManager {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    /// Bind an asset to a template unless a live task already does.
    ///
    /// Returns `true` when a task was inserted and `false` when one existed.
    /// The insert itself is the existence check, so two concurrent calls for
    /// the same pair cannot both create a row.
    pub async fn create_if_not_exists(
        &self,
        template_id: i64,
        asset_id: i64,
        metadata: Option<Value>,
    ) -> AppResult<bool> {
        let new_task = NewTask {
            template_id,
            asset_id,
            metadata,
        };

        match self.repo.insert_if_absent(new_task).await {
            Ok(TaskInsert::Created(task)) => {
                metrics::counter!("tasks_created_total").increment(1);
                tracing::info!(task_id = task.id, asset_id, template_id, "Task created");
                Ok(true)
            }
            Ok(TaskInsert::AlreadyExists) | Err(DbError::UniqueViolation(_)) => {
                metrics::counter!("tasks_deduplicated_total").increment(1);
                tracing::debug!(asset_id, template_id, "Task already exists");
                Ok(false)
            }
            Err(DbError::ForeignKeyViolation(_)) => Err(AppError::invalid(format!(
                "asset {asset_id} or template {template_id} does not exist"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Store a processing result reported by the external pipeline.
    ///
    /// The whole payload replaces the task's metadata. A string `s3_key` in
    /// the payload becomes the referenced asset's output key in the same
    /// write; the asset's status is left alone.
    pub async fn update_task_metadata(&self, payload: Map<String, Value>) -> AppResult<Task> {
        let task_id = validation::task_id_from_payload(&payload)?;

        let loaded = self
            .repo
            .get_with_asset(task_id)
            .await
            .map_err(not_found_as_task)?;

        let output_key = payload
            .get("s3_key")
            .and_then(Value::as_str)
            .map(str::to_string);

        let task = self
            .repo
            .record_result(task_id, Value::Object(payload), output_key.as_deref())
            .await
            .map_err(not_found_as_task)?;

        if let Some(output_key) = output_key {
            tracing::info!(task_id, asset_id = loaded.asset.id, key = %output_key, "Output key recorded");
        }

        Ok(task)
    }

    /// Dispatch a webhook event. Returns whether the event was applied.
    pub async fn handle_event(&self, event_type: &str, payload: Map<String, Value>) -> AppResult<bool> {
        metrics::counter!("webhook_events_total", "event_type" => event_type.to_string())
            .increment(1);

        if event_type != PROCESSED_EVENT {
            tracing::info!(event_type, "Ignoring webhook event");
            return Ok(false);
        }

        self.update_task_metadata(payload).await?;
        Ok(true)
    }
}

fn not_found_as_task(err: DbError) -> AppError {
    match err {
        DbError::NotFound => AppError::not_found("Task"),
        other => other.into(),
    }
}
