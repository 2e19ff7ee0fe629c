use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use std::time::Duration;

/// rust-s3 refuses presign lifetimes above seven days.
const MAX_PRESIGN_SECS: u64 = 7 * 24 * 60 * 60;

/// Opaque blob store addressed by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name recorded alongside stored keys.
    fn bucket(&self) -> &str;

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Presigned GET link valid for `ttl`.
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Client for AWS S3 or any S3-compatible endpoint.
pub struct S3Storage {
    name: String,
    bucket: Box<Bucket>,
}

impl S3Storage {
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, StorageError> {
        let region = match endpoint {
            Some(endpoint) => Region::Custom {
                region: region.to_string(),
                endpoint: endpoint.to_string(),
            },
            None => region
                .parse::<Region>()
                .map_err(|e| StorageError::Config(e.to_string()))?,
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        if endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            name: bucket_name.to_string(),
            bucket,
        })
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await?;
        check_status(response.status_code())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let response = self.bucket.delete_object(key).await?;
        check_status(response.status_code())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let secs = ttl.as_secs().clamp(1, MAX_PRESIGN_SECS) as u32;
        Ok(self.bucket.presign_get(key, secs, None).await?)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.bucket.head_object(key).await {
            Ok((_, 404)) => Ok(false),
            Ok((_, code)) => check_status(code).map(|_| true),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_status(code: u16) -> Result<(), StorageError> {
    if (200..300).contains(&code) {
        Ok(())
    } else {
        Err(StorageError::Status(code))
    }
}

/// Gateway used when no object-store credentials are configured.
pub struct UnconfiguredStorage;

#[async_trait]
impl ObjectStore for UnconfiguredStorage {
    fn bucket(&self) -> &str {
        ""
    }

    async fn put(&self, _key: &str, _data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        Err(StorageError::NotConfigured)
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::NotConfigured)
    }

    async fn presign(&self, _key: &str, _ttl: Duration) -> Result<String, StorageError> {
        Err(StorageError::NotConfigured)
    }

    async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
        Err(StorageError::NotConfigured)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] S3Error),

    #[error("S3 responded with status {0}")]
    Status(u16),

    #[error("Storage configuration error: {0}")]
    Config(String),

    #[error("Object storage is not configured")]
    NotConfigured,
}
