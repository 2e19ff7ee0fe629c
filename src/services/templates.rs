use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::db::TemplateRepository;
use crate::error::{AppError, AppResult};
use crate::models::template::{NewTemplate, Template, TemplateLink};
use crate::services::assets::Upload;
use crate::services::storage::ObjectStore;
use crate::services::validation;

/// Lifetime of the links returned by [`TemplateManager::list`].
pub const TEMPLATE_URL_TTL: Duration = Duration::from_secs(15 * 60);

pub struct TemplateManager {
    repo: Arc<dyn TemplateRepository>,
    store: Arc<dyn ObjectStore>,
}

impl TemplateManager {
    pub fn new(repo: Arc<dyn TemplateRepository>, store: Arc<dyn ObjectStore>) -> Self {
        Self { repo, store }
    }

    /// Upload a template under `template/` and register it by name.
    pub async fn create(&self, name: &str, upload: Upload) -> AppResult<Template> {
        let name = name.trim();
        if name.is_empty() || upload.data.is_empty() {
            return Err(AppError::invalid("name and file are required"));
        }

        let key = validation::object_key(
            validation::TEMPLATE_NAMESPACE,
            Some(name),
            &upload.file_name,
            Utc::now(),
        );
        self.store
            .put(&key, &upload.data, &upload.content_type)
            .await?;

        let new_template = NewTemplate {
            name: name.to_string(),
            key: key.clone(),
            bucket: self.store.bucket().to_string(),
        };

        match self.repo.create(new_template).await {
            Ok(template) => {
                metrics::counter!("templates_created_total").increment(1);
                tracing::info!(template_id = template.id, key = %template.key, "Template registered");
                Ok(template)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned template upload");
                }
                Err(e.into())
            }
        }
    }

    /// All live templates with fresh links; an entry whose link cannot be
    /// signed gets an empty URL.
    pub async fn list(&self) -> AppResult<Vec<TemplateLink>> {
        let templates = self.repo.list().await?;

        let mut links = Vec::with_capacity(templates.len());
        for template in templates {
            let url = match self.store.presign(&template.key, TEMPLATE_URL_TTL).await {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(template_id = template.id, error = %e, "Failed to presign template");
                    String::new()
                }
            };
            links.push(TemplateLink {
                name: template.name,
                url,
            });
        }
        Ok(links)
    }
}
