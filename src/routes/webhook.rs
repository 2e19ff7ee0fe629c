use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::error::AppResult;
use crate::models::requests::{MessageResponse, WebhookRequest};

/// POST /webhook: notification from the external processing pipeline.
pub async fn handle_webhook(
    State(state): State<AppState>,
    body: Result<Json<WebhookRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(req) = body?;
    req.validate()?;

    state.tasks.handle_event(&req.event_type, req.payload).await?;

    Ok(Json(MessageResponse::new("Event processed successfully")))
}
