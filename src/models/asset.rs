use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Processing status of an uploaded asset.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, AsRefStr, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AssetStatus {
    #[default]
    Uploaded,
    Processed,
}

/// An uploaded media file and its metadata record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    #[serde(rename = "s3_key")]
    pub input_key: String,
    #[serde(rename = "output_s3_key", skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
    #[serde(rename = "s3_bucket")]
    pub bucket: String,
    pub status: AssetStatus,
    pub uploaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a freshly uploaded asset.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub input_key: String,
    pub bucket: String,
}

/// Replacement values for the mutable columns of an asset.
#[derive(Debug, Clone)]
pub struct AssetChanges {
    pub file_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub input_key: String,
    pub output_key: Option<String>,
    pub bucket: String,
    pub status: AssetStatus,
}

/// One page of the asset listing.
#[derive(Debug, Clone, Serialize)]
pub struct AssetPage {
    pub assets: Vec<Asset>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Presigned access links for an asset's input and output objects.
#[derive(Debug, Clone, Serialize)]
pub struct AssetUrls {
    pub input_url: String,
    pub output_url: Option<String>,
    /// Seconds until the links expire.
    pub expires_in: u64,
}

/// Result of probing the object store for an asset's processed output.
#[derive(Debug, Clone, Serialize)]
pub struct AssetStatusReport {
    pub status: AssetStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub file_url: String,
    pub message: String,
}
