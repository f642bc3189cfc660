use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::app::decode::decode_source;
use crate::app::error::{JobError, UploadFailure};
use crate::app::variants::VariantMatrix;
use crate::config::variants::{is_accepted_image_extension, RESIZED_PREFIX};
use crate::domain::media::{split_extension, ImageEncoding, ImageSource, ObjectRef, ResizedArtifact};
use crate::infra::storage::{ObjectStore, StorageError};

#[derive(Clone)]
pub struct ResizeService {
    store: Arc<dyn ObjectStore>,
    variants: Arc<VariantMatrix>,
    storage_timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResizeReport {
    pub bucket: String,
    pub uploaded: Vec<String>,
}

#[derive(Debug)]
pub enum ResizeOutcome {
    NotProcessed,
    Processed(ResizeReport),
}

impl ResizeService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        variants: Arc<VariantMatrix>,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            store,
            variants,
            storage_timeout,
        }
    }

    /// Resizes one uploaded image into every matrix cell and uploads all variants
    /// concurrently. Every upload runs to completion; any failure fails the job
    /// and is listed in the error.
    pub async fn handle(&self, object: &ObjectRef) -> Result<ResizeOutcome, JobError> {
        if !accepts(&object.key) {
            info!(bucket = %object.bucket, key = %object.key, "file is not supported, skipping");
            return Ok(ResizeOutcome::NotProcessed);
        }

        let data = tokio::time::timeout(self.storage_timeout, self.store.fetch(object))
            .await
            .map_err(|_| JobError::Fetch(StorageError::Timeout))?
            .map_err(JobError::Fetch)?;
        debug!(source = %object, bytes = data.len(), "fetched source image");

        let source = ImageSource {
            object: object.clone(),
            data,
        };
        let artifacts = self.fan_out(&source).await?;
        let uploaded = self.upload_all(&object.bucket, artifacts).await?;

        info!(source = %object, variants = uploaded.len(), "resize completed");
        Ok(ResizeOutcome::Processed(ResizeReport {
            bucket: object.bucket.clone(),
            uploaded,
        }))
    }

    /// One artifact per matrix cell, in matrix order. The source is decoded once;
    /// each cell then runs its own resize and encode on the blocking pool.
    pub async fn fan_out(&self, source: &ImageSource) -> Result<Vec<ResizedArtifact>, JobError> {
        let data = source.data.clone();
        let extension = source.object.extension().map(str::to_string);
        let decoded =
            tokio::task::spawn_blocking(move || decode_source(&data, extension.as_deref()))
                .await?
                .map_err(|err| JobError::Decode(err.to_string()))?;
        let decoded = Arc::new(decoded);

        let tasks = self.variants.cells().iter().map(|cell| {
            let image = decoded.clone();
            let transform = cell.transform;
            let key = resized_key(&source.object.key, cell.width, cell.encoding);
            async move {
                let encoded = tokio::task::spawn_blocking(move || transform.apply(&image))
                    .await?
                    .map_err(|err| JobError::Transform {
                        key: key.clone(),
                        message: err.to_string(),
                    })?;
                Ok::<_, JobError>(ResizedArtifact {
                    width: transform.width,
                    encoding: transform.encoding,
                    key,
                    data: encoded,
                })
            }
        });

        join_all(tasks).await.into_iter().collect()
    }

    async fn upload_all(
        &self,
        bucket: &str,
        artifacts: Vec<ResizedArtifact>,
    ) -> Result<Vec<String>, JobError> {
        let total = artifacts.len();
        let uploads = artifacts.into_iter().map(|artifact| async move {
            let put = self.store.put_public(
                bucket,
                &artifact.key,
                artifact.content_type(),
                artifact.data.clone(),
            );
            let result = match tokio::time::timeout(self.storage_timeout, put).await {
                Ok(result) => result,
                Err(_) => Err(StorageError::Timeout),
            };
            (artifact.key, result)
        });

        let mut uploaded = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (key, result) in join_all(uploads).await {
            match result {
                Ok(()) => uploaded.push(key),
                Err(err) => {
                    warn!(error = %err, key = %key, "variant upload failed");
                    failures.push(UploadFailure {
                        timed_out: matches!(err, StorageError::Timeout),
                        reason: err.to_string(),
                        key,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(uploaded)
        } else {
            Err(JobError::Uploads { total, failures })
        }
    }
}

/// Extension allow-list check plus a guard against re-processing our own output.
pub fn accepts(key: &str) -> bool {
    if key.starts_with(&format!("{}/", RESIZED_PREFIX)) {
        return false;
    }
    match split_extension(key).1 {
        Some(ext) => is_accepted_image_extension(ext),
        None => false,
    }
}

/// `scaled/<key without extension>-w<width>.<format>`
pub fn resized_key(source_key: &str, width: u32, encoding: ImageEncoding) -> String {
    let (stem, _) = split_extension(source_key);
    format!("{}/{}-w{}.{}", RESIZED_PREFIX, stem, width, encoding)
}
