use anyhow::Result;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::AppConfig;
use crate::domain::media::ObjectRef;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("fetch of {object} failed: {message}")]
    FetchFailed { object: String, message: String },

    #[error("upload of {key} failed: {message}")]
    UploadFailed { key: String, message: String },

    #[error("storage operation timed out")]
    Timeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The object storage operations the pipelines need.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads the whole object into memory.
    async fn fetch(&self, object: &ObjectRef) -> Result<Bytes, StorageError>;

    /// Streams the object to a local file, returning the bytes written.
    async fn download_to(&self, object: &ObjectRef, path: &Path) -> Result<u64, StorageError>;

    /// Writes a world-readable object.
    async fn put_public(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), StorageError>;
}

#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
}

impl ObjectStorage {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let region_provider = RegionProviderChain::first_try(Region::new(config.s3_region.clone()));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config)
            .region(shared_config.region().cloned());
        if let Some(endpoint) = &config.s3_endpoint {
            s3_builder = s3_builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }
        if let Some(provider) = shared_config.credentials_provider() {
            s3_builder = s3_builder.credentials_provider(provider);
        }
        let s3_config = s3_builder.build();

        let client = Client::from_conf(s3_config);

        Ok(Self { client })
    }
}

#[async_trait]
impl ObjectStore for ObjectStorage {
    async fn fetch(&self, object: &ObjectRef) -> Result<Bytes, StorageError> {
        let fetch_failed = |message: String| StorageError::FetchFailed {
            object: object.to_string(),
            message,
        };

        let response = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|err| fetch_failed(DisplayErrorContext(&err).to_string()))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|err| fetch_failed(err.to_string()))?
            .into_bytes();
        Ok(data)
    }

    async fn download_to(&self, object: &ObjectRef, path: &Path) -> Result<u64, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(|err| StorageError::FetchFailed {
                object: object.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(path).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        Ok(written)
    }

    async fn put_public(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StorageError::UploadFailed {
                key: key.to_string(),
                message: DisplayErrorContext(&err).to_string(),
            })?;
        Ok(())
    }
}
