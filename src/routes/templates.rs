use axum::extract::{Multipart, State};
use axum::Json;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::requests::TemplateCreatedResponse;
use crate::models::template::TemplateLink;
use crate::routes::read_upload;

/// POST /api/templates: register a template (multipart fields `name`, `file`).
pub async fn upload_template(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<TemplateCreatedResponse>> {
    let mut upload = None;
    let mut name = String::new();

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => upload = Some(read_upload(field).await?),
            Some("name") => name = field.text().await?,
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::invalid("name and file are required"))?;
    let template = state.templates.create(&name, upload).await?;

    Ok(Json(TemplateCreatedResponse {
        message: "template uploaded".to_string(),
        template,
    }))
}

/// GET /api/templates
pub async fn list_templates(State(state): State<AppState>) -> AppResult<Json<Vec<TemplateLink>>> {
    Ok(Json(state.templates.list().await?))
}
