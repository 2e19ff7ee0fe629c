use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::template::Template;

/// Query parameters for `GET /api/assets`.
#[derive(Debug, Default, Deserialize)]
pub struct ListAssetsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for `GET /api/assets/{id}/url`.
#[derive(Debug, Default, Deserialize)]
pub struct AssetUrlQuery {
    /// Link lifetime in minutes.
    pub expiration: Option<i64>,
}

/// Body of `PATCH /api/assets/{id}/status`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[garde(length(min = 1, max = 50))]
    pub status: String,

    #[garde(length(min = 1, max = 500))]
    pub output_s3_key: Option<String>,
}

/// Body of `PUT /api/assets/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAssetRequest {
    #[garde(length(min = 1, max = 255))]
    pub file_name: String,

    #[garde(range(min = 1))]
    pub file_size: i64,

    #[garde(length(min = 1, max = 100))]
    pub content_type: String,

    #[garde(length(min = 1, max = 500))]
    pub s3_key: String,

    #[garde(length(min = 1, max = 500))]
    pub output_s3_key: Option<String>,

    #[garde(length(min = 1, max = 255))]
    pub s3_bucket: String,

    #[garde(skip)]
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "uploaded".to_string()
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[garde(range(min = 1))]
    pub template_id: i64,

    #[garde(range(min = 1))]
    pub asset_id: i64,

    #[garde(skip)]
    pub metadata: Option<serde_json::Value>,
}

/// Body of `POST /webhook`.
#[derive(Debug, Deserialize, Validate)]
pub struct WebhookRequest {
    #[garde(length(min = 1, max = 100))]
    pub event_type: String,

    #[garde(skip)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// Generic acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response of `POST /api/templates`.
#[derive(Debug, Serialize)]
pub struct TemplateCreatedResponse {
    pub message: String,
    pub template: Template,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task_rejects_zero_ids() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"template_id": 0, "asset_id": 3}"#).unwrap();
        assert!(req.validate().is_err());

        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"template_id": 7, "asset_id": 3}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.metadata.is_none());
    }

    #[test]
    fn test_webhook_requires_payload() {
        let missing = serde_json::from_str::<WebhookRequest>(r#"{"event_type": "processed"}"#);
        assert!(missing.is_err());

        let req: WebhookRequest =
            serde_json::from_str(r#"{"event_type": "", "payload": {}}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_asset_defaults_status() {
        let req: UpdateAssetRequest = serde_json::from_str(
            r#"{"file_name": "a.mp4", "file_size": 10, "content_type": "video/mp4",
                "s3_key": "input/a.mp4", "s3_bucket": "ads"}"#,
        )
        .unwrap();
        assert_eq!(req.status, "uploaded");
        assert!(req.validate().is_ok());
    }
}
