//! Cloudflare R2 backend over the S3 API.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{Operation, StorageError, StorageResult};
use crate::object_store::ObjectStore;

/// Configuration for R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// S3-compatible account endpoint
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    /// `auto` unless the bucket is pinned
    pub region: String,
}

impl R2Config {
    /// Read `R2_*` variables; everything but the region is required.
    pub fn from_env() -> StorageResult<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| StorageError::Config(format!("{} not set", name)))
        };
        Ok(Self {
            endpoint_url: required("R2_ENDPOINT_URL")?,
            access_key_id: required("R2_ACCESS_KEY_ID")?,
            secret_access_key: required("R2_SECRET_ACCESS_KEY")?,
            bucket_name: required("R2_BUCKET_NAME")?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Cloudflare R2 storage client.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
}

impl R2Client {
    pub fn new(config: R2Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
        }
    }

    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(R2Config::from_env()?))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, key: &str, body: ByteStream, content_type: &str) -> StorageResult<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::request(Operation::Put, key, e))?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::request(Operation::Put, key, e))?;
        self.put_object(key, body, content_type).await?;
        info!(key, source = %path.display(), "Stored object");
        Ok(())
    }

    async fn put_bytes(&self, data: Vec<u8>, key: &str, content_type: &str) -> StorageResult<()> {
        debug!(key, bytes = data.len(), "Storing in-memory object");
        self.put_object(key, ByteStream::from(data), content_type).await
    }

    async fn get_to_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.into_service_error() {
                err if err.is_no_such_key() => StorageError::not_found(key),
                err => StorageError::request(Operation::Get, key, err),
            })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(path).await?;
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| StorageError::request(Operation::Get, key, e))?;

        info!(key, bytes = written, dest = %path.display(), "Fetched object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::request(Operation::Delete, key, e))?;
        debug!(key, "Deleted object");
        Ok(())
    }

    async fn signed_download_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        let expiry = PresigningConfig::expires_in(ttl)
            .map_err(|e| StorageError::request(Operation::Presign, key, e))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(expiry)
            .await
            .map_err(|e| StorageError::request(Operation::Presign, key, e))?;

        Ok(request.uri().to_string())
    }

    /// Head-bucket round trip.
    async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::request(Operation::Probe, &self.bucket, e))?;
        Ok(())
    }
}
