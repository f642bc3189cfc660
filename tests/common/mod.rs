#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageBuffer, Rgba};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use media_jobs::app::variants::VariantMatrix;
use media_jobs::config::JobSettings;
use media_jobs::domain::media::ObjectRef;
use media_jobs::infra::decoder::{DecoderError, FrameDecoder};
use media_jobs::infra::storage::{ObjectStore, StorageError};
use media_jobs::AppState;

// ---------------------------------------------------------------------------
// FakeStore — in-memory object storage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Default)]
pub struct FakeStore {
    objects: Mutex<HashMap<(String, String), Bytes>>,
    puts: Mutex<Vec<StoredObject>>,
    failing_keys: Mutex<HashSet<String>>,
    fetches: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn fail_uploads_for(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn puts(&self) -> Vec<StoredObject> {
        self.puts.lock().unwrap().clone()
    }

    pub fn put_keys(&self) -> Vec<String> {
        self.puts().into_iter().map(|put| put.key).collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lookup(&self, object: &ObjectRef) -> Result<Bytes, StorageError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(&(object.bucket.clone(), object.key.clone()))
            .cloned()
            .ok_or_else(|| StorageError::FetchFailed {
                object: object.to_string(),
                message: "NoSuchKey".to_string(),
            })
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn fetch(&self, object: &ObjectRef) -> Result<Bytes, StorageError> {
        self.lookup(object)
    }

    async fn download_to(&self, object: &ObjectRef, path: &Path) -> Result<u64, StorageError> {
        let body = self.lookup(object)?;
        tokio::fs::write(path, &body).await?;
        Ok(body.len() as u64)
    }

    async fn put_public(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<(), StorageError> {
        if self.failing_keys.lock().unwrap().contains(key) {
            return Err(StorageError::UploadFailed {
                key: key.to_string(),
                message: "AccessDenied".to_string(),
            });
        }
        self.puts.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            body,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeDecoder — writes a small JPEG instead of running ffmpeg
// ---------------------------------------------------------------------------

pub struct FakeDecoder {
    duration: Option<u64>,
    missing: HashSet<u64>,
    probed: Mutex<Vec<String>>,
    extracted: Mutex<Vec<u64>>,
}

impl FakeDecoder {
    pub fn with_duration(duration: u64) -> Arc<Self> {
        Arc::new(Self::build(Some(duration), HashSet::new()))
    }

    /// Probe always fails, as with unparseable ffprobe output.
    pub fn unprobeable() -> Arc<Self> {
        Arc::new(Self::build(None, HashSet::new()))
    }

    /// Extraction at any of `missing` produces no file.
    pub fn with_missing_frames(duration: u64, missing: &[u64]) -> Arc<Self> {
        Arc::new(Self::build(Some(duration), missing.iter().copied().collect()))
    }

    fn build(duration: Option<u64>, missing: HashSet<u64>) -> Self {
        Self {
            duration,
            missing,
            probed: Mutex::new(Vec::new()),
            extracted: Mutex::new(Vec::new()),
        }
    }

    pub fn extracted(&self) -> Vec<u64> {
        self.extracted.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.probed.lock().unwrap().len()
    }
}

#[async_trait]
impl FrameDecoder for FakeDecoder {
    async fn probe_duration(&self, video: &Path) -> Result<u64, DecoderError> {
        self.probed
            .lock()
            .unwrap()
            .push(video.display().to_string());
        self.duration
            .ok_or_else(|| DecoderError::UnparseableDuration("N/A".to_string()))
    }

    async fn extract_frame(
        &self,
        _video: &Path,
        second: u64,
        output: &Path,
    ) -> Result<(), DecoderError> {
        self.extracted.lock().unwrap().push(second);
        if self.missing.contains(&second) {
            return Ok(());
        }
        tokio::fs::write(output, jpeg_bytes(48, 27))
            .await
            .map_err(|source| DecoderError::Spawn {
                tool: "fake-ffmpeg".to_string(),
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(width, height, Rgba([200u8, 40, 90, 255]));
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(width, height, image::Rgb([10u8, 120, 230]));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}

/// An "object created" notification as delivered by S3.
pub fn s3_event(bucket: &str, key: &str) -> Value {
    json!({
        "Records": [{
            "eventVersion": "2.0",
            "eventSource": "aws:s3",
            "awsRegion": "eu-west-1",
            "eventTime": "1970-01-01T00:00:00.000Z",
            "eventName": "ObjectCreated:Put",
            "s3": {
                "s3SchemaVersion": "1.0",
                "configurationId": "testConfigRule",
                "bucket": { "name": bucket, "arn": format!("arn:aws:s3:::{}", bucket) },
                "object": { "key": key, "size": 1024, "eTag": "0123456789abcdef" }
            }
        }]
    })
}

pub struct TestEnv {
    pub store: Arc<FakeStore>,
    pub decoder: Arc<FakeDecoder>,
    pub state: AppState,
    pub work_dir: TempDir,
}

impl TestEnv {
    pub fn new(decoder: Arc<FakeDecoder>) -> Self {
        let store = FakeStore::new();
        let work_dir = tempfile::tempdir().unwrap();
        let state = AppState {
            storage: store.clone(),
            decoder: decoder.clone(),
            variants: Arc::new(VariantMatrix::standard()),
            settings: JobSettings {
                work_dir: work_dir.path().to_path_buf(),
                storage_timeout: Duration::from_secs(5),
                thumbnail_count: 3,
                thumbnail_target_bucket: None,
            },
        };
        Self {
            store,
            decoder,
            state,
            work_dir,
        }
    }

    /// Files left behind in the scratch directory.
    pub fn leftover_files(&self) -> Vec<String> {
        std::fs::read_dir(self.work_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect()
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = media_jobs::http::router(self.state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
