use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Full PostgreSQL connection string; takes precedence over the DB_* parts.
    pub database_url: Option<String>,

    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    #[serde(default = "default_db_user")]
    pub db_user: String,

    #[serde(default = "default_db_password")]
    pub db_password: String,

    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// AWS region of the bucket (e.g., "us-east-1")
    pub aws_region: Option<String>,

    pub aws_access_key_id: Option<String>,

    pub aws_secret_access_key: Option<String>,

    /// Bucket holding asset and template objects
    pub aws_s3_bucket: Option<String>,

    /// Endpoint of an S3-compatible service, when not using AWS itself
    pub aws_s3_endpoint: Option<String>,

    /// Largest accepted request body, in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

/// Object-store settings, present only when every required variable is set.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub endpoint: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "screensaver_ad".to_string()
}

fn default_max_upload_mb() -> usize {
    100
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn pg_connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        if let Some(url) = non_empty(&self.database_url) {
            return PgConnectOptions::from_str(&url);
        }

        Ok(PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name))
    }

    /// `None` disables uploads without preventing startup.
    pub fn storage(&self) -> Option<StorageConfig> {
        Some(StorageConfig {
            region: non_empty(&self.aws_region)?,
            access_key: non_empty(&self.aws_access_key_id)?,
            secret_key: non_empty(&self.aws_secret_access_key)?,
            bucket: non_empty(&self.aws_s3_bucket)?,
            endpoint: non_empty(&self.aws_s3_endpoint),
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}
