//! In-memory collaborators for exercising the managers and router without
//! PostgreSQL or S3.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use screensaver_ad_backend::app_state::AppState;
use screensaver_ad_backend::db::{AssetRepository, DbError, TaskRepository, TemplateRepository};
use screensaver_ad_backend::models::asset::{Asset, AssetChanges, AssetStatus, NewAsset};
use screensaver_ad_backend::models::task::{NewTask, Task, TaskInsert, TaskWithAsset};
use screensaver_ad_backend::models::template::{NewTemplate, Template};
use screensaver_ad_backend::services::assets::Upload;
use screensaver_ad_backend::services::storage::{ObjectStore, StorageError};

pub const TEST_BUCKET: &str = "screensaver-ads-test";

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    unsignable: Mutex<HashSet<String>>,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub fail_puts: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn has_object(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn content_type_of(&self, key: &str) -> Option<String> {
        self.objects.lock().unwrap().get(key).map(|(_, ct)| ct.clone())
    }

    /// Place an object directly, as the external pipeline would.
    pub fn insert_object(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), "video/mp4".to_string()));
    }

    /// Make presigning `key` fail.
    pub fn refuse_presign(&self, key: &str) {
        self.unsignable.lock().unwrap().insert(key.to_string());
    }

    pub fn put_calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        TEST_BUCKET
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Status(503));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Status(500));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        if self.unsignable.lock().unwrap().contains(key) {
            return Err(StorageError::Status(403));
        }
        Ok(format!(
            "https://{TEST_BUCKET}.s3.test/{key}?X-Amz-Expires={}",
            ttl.as_secs()
        ))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.has_object(key))
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryAssetRepository {
    rows: Mutex<Vec<Asset>>,
    next_id: AtomicI64,
    pub fail_inserts: AtomicBool,
}

impl MemoryAssetRepository {
    /// Row including soft-deleted ones.
    pub fn raw(&self, id: i64) -> Option<Asset> {
        self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Overwrite a stored row in place.
    pub fn put_raw(&self, asset: Asset) {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|a| a.id == asset.id) {
            *row = asset;
        }
    }

    fn key_taken(rows: &[Asset], key: &str, except: i64) -> bool {
        rows.iter().any(|a| a.input_key == key && a.id != except)
    }
}

#[async_trait]
impl AssetRepository for MemoryAssetRepository {
    async fn create(&self, asset: NewAsset) -> Result<Asset, DbError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let mut rows = self.rows.lock().unwrap();
        if Self::key_taken(&rows, &asset.input_key, 0) {
            return Err(DbError::UniqueViolation("uq_asset_s3_key".into()));
        }

        let now = Utc::now();
        let row = Asset {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            file_name: asset.file_name,
            file_size: asset.file_size,
            content_type: asset.content_type,
            input_key: asset.input_key,
            output_key: None,
            bucket: asset.bucket,
            status: AssetStatus::Uploaded,
            uploaded_at: now,
            processed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn get_by_id(&self, id: i64) -> Result<Asset, DbError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Asset>, DbError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .rev()
            .filter(|a| a.deleted_at.is_none())
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, DbError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|a| a.deleted_at.is_none()).count() as i64)
    }

    async fn update(&self, id: i64, changes: AssetChanges) -> Result<Asset, DbError> {
        let mut rows = self.rows.lock().unwrap();
        if Self::key_taken(&rows, &changes.input_key, id) {
            return Err(DbError::UniqueViolation("uq_asset_s3_key".into()));
        }
        let row = rows
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .ok_or(DbError::NotFound)?;

        row.processed_at = match changes.status {
            AssetStatus::Processed => row.processed_at.or(Some(Utc::now())),
            AssetStatus::Uploaded => None,
        };
        row.file_name = changes.file_name;
        row.file_size = changes.file_size;
        row.content_type = changes.content_type;
        row.input_key = changes.input_key;
        row.output_key = changes.output_key;
        row.bucket = changes.bucket;
        row.status = changes.status;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn update_status(
        &self,
        id: i64,
        status: AssetStatus,
        output_key: Option<&str>,
    ) -> Result<Asset, DbError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .ok_or(DbError::NotFound)?;

        row.processed_at = match status {
            AssetStatus::Processed => row.processed_at.or(Some(Utc::now())),
            AssetStatus::Uploaded => None,
        };
        row.status = status;
        if let Some(key) = output_key {
            row.output_key = Some(key.to_string());
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn soft_delete(&self, id: i64) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .ok_or(DbError::NotFound)?;
        row.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTemplateRepository {
    rows: Mutex<Vec<Template>>,
    next_id: AtomicI64,
}

impl MemoryTemplateRepository {
    /// Insert a template row with a fixed id.
    pub fn seed(&self, id: i64, name: &str) {
        let now = Utc::now();
        self.rows.lock().unwrap().push(Template {
            id,
            name: name.to_string(),
            key: format!("template/{name}.mp4"),
            bucket: TEST_BUCKET.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        });
        self.next_id.fetch_max(id, Ordering::SeqCst);
    }

    pub fn exists(&self, id: i64) -> bool {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.id == id && t.deleted_at.is_none())
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl TemplateRepository for MemoryTemplateRepository {
    async fn create(&self, template: NewTemplate) -> Result<Template, DbError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|t| t.name == template.name) {
            return Err(DbError::UniqueViolation("uq_template_name".into()));
        }
        if rows.iter().any(|t| t.key == template.key) {
            return Err(DbError::UniqueViolation("uq_template_s3_key".into()));
        }

        let now = Utc::now();
        let row = Template {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: template.name,
            key: template.key,
            bucket: template.bucket,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Template>, DbError> {
        let mut rows: Vec<Template> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.deleted_at.is_none())
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.id);
        Ok(rows)
    }
}

pub struct MemoryTaskRepository {
    rows: Mutex<Vec<Task>>,
    next_id: AtomicI64,
    assets: Arc<MemoryAssetRepository>,
    templates: Arc<MemoryTemplateRepository>,
    /// Report storage failures from every call.
    pub broken: AtomicBool,
}

impl MemoryTaskRepository {
    pub fn new(assets: Arc<MemoryAssetRepository>, templates: Arc<MemoryTemplateRepository>) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(0),
            assets,
            templates,
            broken: AtomicBool::new(false),
        }
    }

    pub fn live_tasks_for(&self, asset_id: i64, template_id: i64) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                t.asset_id == asset_id && t.template_id == template_id && t.deleted_at.is_none()
            })
            .count()
    }

    pub fn get(&self, id: i64) -> Option<Task> {
        self.rows.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    fn check_broken(&self) -> Result<(), DbError> {
        if self.broken.load(Ordering::SeqCst) {
            Err(DbError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn insert_if_absent(&self, task: NewTask) -> Result<TaskInsert, DbError> {
        self.check_broken()?;
        if self.assets.raw(task.asset_id).is_none() || !self.templates.exists(task.template_id) {
            return Err(DbError::ForeignKeyViolation("task_metadata_fkey".into()));
        }

        let mut rows = self.rows.lock().unwrap();
        let duplicate = rows.iter().any(|t| {
            t.asset_id == task.asset_id
                && t.template_id == task.template_id
                && t.deleted_at.is_none()
        });
        if duplicate {
            return Ok(TaskInsert::AlreadyExists);
        }

        let now = Utc::now();
        let row = Task {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            template_id: task.template_id,
            asset_id: task.asset_id,
            metadata: task.metadata,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        rows.push(row.clone());
        Ok(TaskInsert::Created(row))
    }

    async fn get_with_asset(&self, id: i64) -> Result<TaskWithAsset, DbError> {
        self.check_broken()?;
        let task = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.deleted_at.is_none())
            .cloned()
            .ok_or(DbError::NotFound)?;
        let asset = self.assets.get_by_id(task.asset_id).await?;
        Ok(TaskWithAsset { task, asset })
    }

    async fn record_result(
        &self,
        id: i64,
        metadata: serde_json::Value,
        output_key: Option<&str>,
    ) -> Result<Task, DbError> {
        self.check_broken()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|t| t.id == id && t.deleted_at.is_none())
            .ok_or(DbError::NotFound)?;

        // The asset write is checked before the task changes, as a rollback would leave it.
        if let Some(key) = output_key {
            let mut asset = self
                .assets
                .raw(row.asset_id)
                .filter(|a| a.deleted_at.is_none())
                .ok_or(DbError::NotFound)?;
            asset.output_key = Some(key.to_string());
            asset.updated_at = Utc::now();
            self.assets.put_raw(asset);
        }

        row.metadata = Some(metadata);
        row.updated_at = Utc::now();
        Ok(row.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// Fakes wired into an [`AppState`], with handles kept for assertions.
pub struct TestBackend {
    pub store: Arc<MemoryStore>,
    pub assets: Arc<MemoryAssetRepository>,
    pub templates: Arc<MemoryTemplateRepository>,
    pub tasks: Arc<MemoryTaskRepository>,
    pub state: AppState,
}

impl TestBackend {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let assets = Arc::new(MemoryAssetRepository::default());
        let templates = Arc::new(MemoryTemplateRepository::default());
        let tasks = Arc::new(MemoryTaskRepository::new(assets.clone(), templates.clone()));

        let state = AppState::new(
            assets.clone(),
            templates.clone(),
            tasks.clone(),
            store.clone(),
            true,
        );

        Self {
            store,
            assets,
            templates,
            tasks,
            state,
        }
    }
}

pub fn upload(file_name: &str, content_type: &str, size: usize) -> Upload {
    Upload {
        data: vec![0u8; size],
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        declared_size: size as i64,
    }
}
