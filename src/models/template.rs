use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reusable video template registered for ad generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: i64,
    pub name: String,
    #[serde(rename = "s3_key")]
    pub key: String,
    #[serde(rename = "s3_bucket")]
    pub bucket: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub name: String,
    pub key: String,
    pub bucket: String,
}

/// Template listing entry with a short-lived download link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateLink {
    pub name: String,
    pub url: String,
}
