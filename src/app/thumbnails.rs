use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::error::JobError;
use crate::app::sampler::sample_timestamps;
use crate::config::variants::{THUMBNAIL_CONTENT_TYPE, THUMBNAIL_PREFIX};
use crate::config::JobSettings;
use crate::domain::media::{split_extension, ObjectRef, ThumbnailArtifact, VideoSource};
use crate::infra::decoder::FrameDecoder;
use crate::infra::storage::{ObjectStore, StorageError};

#[derive(Clone)]
pub struct ThumbnailService {
    store: Arc<dyn ObjectStore>,
    decoder: Arc<dyn FrameDecoder>,
    settings: JobSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThumbnailReport {
    pub bucket: String,
    pub duration_seconds: u64,
    pub timestamps: Vec<u64>,
    pub uploaded: Vec<String>,
    pub missed_extractions: usize,
    pub failed_uploads: Vec<String>,
}

#[derive(Debug)]
pub enum ThumbnailOutcome {
    NotProcessed,
    Processed(ThumbnailReport),
}

impl ThumbnailService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        decoder: Arc<dyn FrameDecoder>,
        settings: JobSettings,
    ) -> Self {
        Self {
            store,
            decoder,
            settings,
        }
    }

    /// Downloads the video named by the notification, generates its thumbnails and
    /// removes the local copy whatever happened.
    pub async fn handle(&self, object: &ObjectRef) -> Result<ThumbnailOutcome, JobError> {
        if object.key.starts_with(&format!("{}/", THUMBNAIL_PREFIX)) {
            info!(bucket = %object.bucket, key = %object.key, "skipping generated thumbnail");
            return Ok(ThumbnailOutcome::NotProcessed);
        }

        let source = self.download(object).await?;
        let bucket = self
            .settings
            .thumbnail_target_bucket
            .clone()
            .unwrap_or_else(|| object.bucket.clone());

        let report = self
            .generate(
                &source.local_path,
                self.settings.thumbnail_count,
                object.file_name(),
                &bucket,
            )
            .await;

        remove_quietly(&source.local_path).await;

        info!(
            source = %object,
            uploaded = report.uploaded.len(),
            missed = report.missed_extractions,
            failed = report.failed_uploads.len(),
            "thumbnail generation completed"
        );
        Ok(ThumbnailOutcome::Processed(report))
    }

    /// Samples up to `count` timestamps of a local video and uploads one frame per
    /// timestamp, in sampled order. Missing frames and failed uploads are skipped.
    pub async fn generate(
        &self,
        video: &Path,
        count: usize,
        video_name: &str,
        bucket: &str,
    ) -> ThumbnailReport {
        let duration = self.probe_duration(video).await;
        let timestamps = {
            let mut rng = rand::thread_rng();
            sample_timestamps(count, duration, &mut rng)
        };
        debug!(duration, ?timestamps, "sampled thumbnail timestamps");

        let mut report = ThumbnailReport {
            bucket: bucket.to_string(),
            duration_seconds: duration,
            timestamps: timestamps.clone(),
            uploaded: Vec::new(),
            missed_extractions: 0,
            failed_uploads: Vec::new(),
        };

        for (ordinal, timestamp) in timestamps.into_iter().enumerate() {
            let artifact = match self.extract(video, timestamp, ordinal, video_name).await {
                Some(artifact) => artifact,
                None => {
                    report.missed_extractions += 1;
                    continue;
                }
            };

            match self.upload(&artifact, bucket).await {
                Ok(()) => {
                    info!(
                        key = %artifact.key,
                        timestamp = artifact.timestamp,
                        ordinal = artifact.ordinal,
                        "stored thumbnail"
                    );
                    report.uploaded.push(artifact.key.clone());
                }
                Err(err) => {
                    warn!(
                        error = ?err,
                        key = %artifact.key,
                        timestamp = artifact.timestamp,
                        "thumbnail upload failed, skipping"
                    );
                    report.failed_uploads.push(artifact.key.clone());
                }
            }
            remove_quietly(&artifact.local_path).await;
        }

        report
    }

    async fn download(&self, object: &ObjectRef) -> Result<VideoSource, JobError> {
        let local_path = self.settings.work_dir.join(match object.extension() {
            Some(ext) => format!("video-{}.{}", Uuid::new_v4(), ext),
            None => format!("video-{}", Uuid::new_v4()),
        });

        let download = tokio::time::timeout(
            self.settings.storage_timeout,
            self.store.download_to(object, &local_path),
        )
        .await;

        match download {
            Ok(Ok(bytes)) => {
                debug!(source = %object, bytes, path = %local_path.display(), "downloaded video");
                Ok(VideoSource {
                    object: object.clone(),
                    local_path,
                })
            }
            Ok(Err(err)) => {
                remove_quietly(&local_path).await;
                Err(JobError::Fetch(err))
            }
            Err(_) => {
                remove_quietly(&local_path).await;
                Err(JobError::Fetch(StorageError::Timeout))
            }
        }
    }

    async fn probe_duration(&self, video: &Path) -> u64 {
        match self.decoder.probe_duration(video).await {
            Ok(duration) => duration,
            Err(err) => {
                warn!(error = %err, "duration probe failed, assuming 0");
                0
            }
        }
    }

    async fn extract(
        &self,
        video: &Path,
        timestamp: u64,
        ordinal: usize,
        video_name: &str,
    ) -> Option<ThumbnailArtifact> {
        let local_path = frame_path(&self.settings.work_dir, timestamp);

        if let Err(err) = self
            .decoder
            .extract_frame(video, timestamp, &local_path)
            .await
        {
            // A killed decoder may leave a truncated frame behind.
            warn!(error = %err, timestamp, "frame extraction failed");
            remove_quietly(&local_path).await;
            return None;
        }

        if !tokio::fs::try_exists(&local_path).await.unwrap_or(false) {
            debug!(timestamp, "no frame produced, skipping slot");
            return None;
        }

        Some(ThumbnailArtifact {
            timestamp,
            ordinal,
            key: thumbnail_key(video_name, ordinal),
            local_path,
        })
    }

    async fn upload(&self, artifact: &ThumbnailArtifact, bucket: &str) -> Result<(), StorageError> {
        let body = Bytes::from(tokio::fs::read(&artifact.local_path).await?);
        tokio::time::timeout(
            self.settings.storage_timeout,
            self.store
                .put_public(bucket, &artifact.key, THUMBNAIL_CONTENT_TYPE, body),
        )
        .await
        .map_err(|_| StorageError::Timeout)?
    }
}

/// `<name without extension>-<ordinal>.jpg`
pub fn thumbnail_name(video_name: &str, ordinal: usize) -> String {
    let (stem, _) = split_extension(video_name);
    format!("{}-{}.jpg", stem, ordinal)
}

pub fn thumbnail_key(video_name: &str, ordinal: usize) -> String {
    format!("{}/{}", THUMBNAIL_PREFIX, thumbnail_name(video_name, ordinal))
}

fn frame_path(work_dir: &Path, timestamp: u64) -> PathBuf {
    work_dir.join(format!("thumbnail-{}-{}.jpg", Uuid::new_v4(), timestamp))
}

async fn remove_quietly(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(error = %err, path = %path.display(), "failed to remove temp file");
        }
    }
}
