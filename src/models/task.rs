use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::asset::Asset;

/// A binding of one asset to one template for external processing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub template_id: i64,
    pub asset_id: i64,
    /// Opaque document reported by the processing pipeline.
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub template_id: i64,
    pub asset_id: i64,
    pub metadata: Option<serde_json::Value>,
}

/// Outcome of an insert-if-absent on the (asset, template) pair.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskInsert {
    Created(Task),
    AlreadyExists,
}

/// A task loaded together with the asset it references.
#[derive(Debug, Clone)]
pub struct TaskWithAsset {
    pub task: Task,
    pub asset: Asset,
}
