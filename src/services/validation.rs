use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::path::Path;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// MIME types accepted for asset uploads.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
    "video/x-msvideo",
    "video/webm",
];

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const DEFAULT_URL_TTL_MINUTES: i64 = 60;
/// Seven days, the longest lifetime S3 accepts for a presigned URL.
pub const MAX_URL_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Key prefix for uploaded assets.
pub const INPUT_NAMESPACE: &str = "input";
/// Key prefix for uploaded templates.
pub const TEMPLATE_NAMESPACE: &str = "template";

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(l) if l > MAX_PAGE_LIMIT => MAX_PAGE_LIMIT,
        Some(l) if l > 0 => l,
        _ => DEFAULT_PAGE_LIMIT,
    }
}

pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

pub fn ttl_minutes(requested: Option<i64>) -> i64 {
    match requested {
        Some(m) if m > MAX_URL_TTL_MINUTES => MAX_URL_TTL_MINUTES,
        Some(m) if m > 0 => m,
        _ => DEFAULT_URL_TTL_MINUTES,
    }
}

/// Parse a positive numeric path id.
pub fn parse_id(raw: &str, entity: &str) -> AppResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::invalid(format!("Invalid {entity} ID"))),
    }
}

/// Extract the positive integral `task_id` a webhook payload must carry.
///
/// JSON numbers such as `12.0` are accepted; fractional or non-numeric
/// values are not.
pub fn task_id_from_payload(payload: &Map<String, Value>) -> AppResult<i64> {
    let invalid = || AppError::invalid("task_id not found or invalid in payload");

    let value = payload.get("task_id").ok_or_else(invalid)?;
    let id = match value.as_i64() {
        Some(id) => id,
        None => match value.as_f64() {
            Some(f) if f.fract() == 0.0 && (1.0..=i64::MAX as f64).contains(&f) => f as i64,
            _ => return Err(invalid()),
        },
    };

    if id > 0 {
        Ok(id)
    } else {
        Err(invalid())
    }
}

/// Lower-case a display name and replace spaces so it is safe in a key.
pub fn normalize_name(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

/// Extension of `filename` including the leading dot, or an empty string.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// Build a collision-resistant object key such as `input/summer_sale_1a2b3c4d.mp4`.
///
/// The stem is the normalized custom name when one is given, otherwise the
/// upload time as `YYYYMMDD_HHMMSS`.
pub fn object_key(
    namespace: &str,
    custom_name: Option<&str>,
    original_filename: &str,
    now: DateTime<Utc>,
) -> String {
    let stem = match custom_name.map(normalize_name) {
        Some(name) if !name.is_empty() => name,
        _ => now.format("%Y%m%d_%H%M%S").to_string(),
    };
    let suffix = Uuid::new_v4().simple().to_string();

    format!(
        "{namespace}/{stem}_{}{}",
        &suffix[..8],
        file_extension(original_filename)
    )
}
