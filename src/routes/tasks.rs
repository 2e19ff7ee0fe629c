use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::models::requests::{CreateTaskRequest, MessageResponse};

/// POST /api/tasks: 201 when the task is new, 202 when it already existed.
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(req) = body?;
    req.validate()?;

    let created = state
        .tasks
        .create_if_not_exists(req.template_id, req.asset_id, req.metadata)
        .await?;

    Ok(if created {
        (
            StatusCode::CREATED,
            Json(MessageResponse::new("Task created successfully")),
        )
    } else {
        (
            StatusCode::ACCEPTED,
            Json(MessageResponse::new("Task already exists")),
        )
    })
}
