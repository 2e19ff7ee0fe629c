use sqlx::PgPool;
use std::sync::Arc;

use crate::db::{
    AssetRepository, PgAssetRepository, PgTaskRepository, PgTemplateRepository, TaskRepository,
    TemplateRepository,
};
use crate::services::{
    assets::AssetManager, storage::ObjectStore, tasks::TaskManager, templates::TemplateManager,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<AssetManager>,
    pub templates: Arc<TemplateManager>,
    pub tasks: Arc<TaskManager>,
    /// `None` when handlers run without a database, as in tests.
    pub db: Option<PgPool>,
    pub storage_configured: bool,
}

impl AppState {
    /// Wire the managers to their collaborators.
    pub fn new(
        asset_repo: Arc<dyn AssetRepository>,
        template_repo: Arc<dyn TemplateRepository>,
        task_repo: Arc<dyn TaskRepository>,
        store: Arc<dyn ObjectStore>,
        storage_configured: bool,
    ) -> Self {
        Self {
            assets: Arc::new(AssetManager::new(asset_repo, store.clone())),
            templates: Arc::new(TemplateManager::new(template_repo, store)),
            tasks: Arc::new(TaskManager::new(task_repo)),
            db: None,
            storage_configured,
        }
    }

    /// State backed by the Postgres repositories.
    pub fn with_postgres(pool: PgPool, store: Arc<dyn ObjectStore>, storage_configured: bool) -> Self {
        let mut state = Self::new(
            Arc::new(PgAssetRepository::new(pool.clone())),
            Arc::new(PgTemplateRepository::new(pool.clone())),
            Arc::new(PgTaskRepository::new(pool.clone())),
            store,
            storage_configured,
        );
        state.db = Some(pool);
        state
    }
}
