pub mod variants;

use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pipeline {
    Thumbnails,
    Resize,
}

impl FromStr for Pipeline {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "thumbnails" => Ok(Pipeline::Thumbnails),
            "resize" => Ok(Pipeline::Resize),
            other => Err(anyhow!("unknown pipeline: {}", other)),
        }
    }
}

/// Per-invocation knobs shared by both pipelines.
#[derive(Clone, Debug)]
pub struct JobSettings {
    pub work_dir: PathBuf,
    pub storage_timeout: Duration,
    pub thumbnail_count: usize,
    pub thumbnail_target_bucket: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub app_mode: String,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub queue_endpoint: Option<String>,
    pub queue_region: String,
    pub queue_name: Option<String>,
    pub worker_pipeline: Pipeline,
    pub thumbnail_count: usize,
    pub thumbnail_target_bucket: Option<String>,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub decoder_timeout_seconds: u64,
    pub storage_timeout_seconds: u64,
    pub work_dir: PathBuf,
    pub upload_max_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;
        let app_mode = env_or("APP_MODE", "api");

        let s3_region = env_or("S3_REGION", "us-east-1");
        let queue_region = std::env::var("QUEUE_REGION").unwrap_or_else(|_| s3_region.clone());

        let work_dir = std::env::var("WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir());

        Ok(Self {
            http_addr,
            app_mode,
            s3_endpoint: std::env::var("S3_ENDPOINT").ok(),
            s3_region,
            queue_endpoint: std::env::var("QUEUE_ENDPOINT").ok(),
            queue_region,
            queue_name: std::env::var("QUEUE_NAME").ok(),
            worker_pipeline: env_or_parse("WORKER_PIPELINE", "resize")?,
            thumbnail_count: env_or_parse("THUMBNAIL_COUNT", "3")?,
            thumbnail_target_bucket: std::env::var("THUMBNAIL_TARGET_BUCKET").ok(),
            ffmpeg_path: PathBuf::from(env_or("FFMPEG_PATH", "ffmpeg")),
            ffprobe_path: PathBuf::from(env_or("FFPROBE_PATH", "ffprobe")),
            decoder_timeout_seconds: env_or_parse("DECODER_TIMEOUT_SECONDS", "60")?,
            storage_timeout_seconds: env_or_parse("STORAGE_TIMEOUT_SECONDS", "120")?,
            work_dir,
            upload_max_bytes: env_or_parse("UPLOAD_MAX_BYTES", "1048576")?,
        })
    }

    pub fn queue_name(&self) -> Result<&str> {
        self.queue_name
            .as_deref()
            .ok_or_else(|| anyhow!("missing required env var: QUEUE_NAME"))
    }

    pub fn job_settings(&self) -> JobSettings {
        JobSettings {
            work_dir: self.work_dir.clone(),
            storage_timeout: self.storage_timeout(),
            thumbnail_count: self.thumbnail_count,
            thumbnail_target_bucket: self.thumbnail_target_bucket.clone(),
        }
    }

    pub fn decoder_timeout(&self) -> Duration {
        Duration::from_secs(self.decoder_timeout_seconds)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_seconds)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
