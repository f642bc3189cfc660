// ffprobe / ffmpeg wrapper for duration probing and frame extraction.
//
// Each call runs the tool under a deadline; a child still running when the
// deadline passes is killed when its future is dropped.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::variants::THUMBNAIL_WIDTH;

#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} did not finish within {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("unparseable duration output: {0:?}")]
    UnparseableDuration(String),
}

/// External decoder used by the thumbnail pipeline.
#[async_trait]
pub trait FrameDecoder: Send + Sync {
    /// Container duration in whole seconds.
    async fn probe_duration(&self, video: &Path) -> Result<u64, DecoderError>;

    /// Writes the representative frame near `second` to `output`.
    ///
    /// `Ok` only means the decoder ran; callers must check that `output` exists.
    async fn extract_frame(
        &self,
        video: &Path,
        second: u64,
        output: &Path,
    ) -> Result<(), DecoderError>;
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl Ffmpeg {
    pub fn new(ffmpeg_path: PathBuf, ffprobe_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            timeout,
        }
    }

    async fn run(&self, mut command: Command, tool: &str) -> Result<Output, DecoderError> {
        command.kill_on_drop(true);
        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(|source| DecoderError::Spawn {
                tool: tool.to_string(),
                source,
            }),
            Err(_) => {
                warn!(tool, seconds = self.timeout.as_secs(), "decoder timed out, killed");
                Err(DecoderError::Timeout {
                    tool: tool.to_string(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

#[async_trait]
impl FrameDecoder for Ffmpeg {
    async fn probe_duration(&self, video: &Path) -> Result<u64, DecoderError> {
        let mut command = Command::new(&self.ffprobe_path);
        command
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=nw=1:nk=1",
            ])
            .arg(video)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = self.run(command, "ffprobe").await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                status = %output.status,
                stderr = %stderr.trim(),
                "ffprobe exited with failure"
            );
        }

        parse_duration_output(&stdout)
            .ok_or_else(|| DecoderError::UnparseableDuration(stdout.trim().to_string()))
    }

    async fn extract_frame(
        &self,
        video: &Path,
        second: u64,
        output: &Path,
    ) -> Result<(), DecoderError> {
        let filter = format!("thumbnail,scale={}:-1", THUMBNAIL_WIDTH);
        let mut command = Command::new(&self.ffmpeg_path);
        command
            .arg("-ss")
            .arg(second.to_string())
            .arg("-i")
            .arg(video)
            .args(["-vf", filter.as_str(), "-vframes", "1"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let result = self.run(command, "ffmpeg").await?;
        // Exit status is advisory; the output file is the source of truth.
        if !result.status.success() {
            warn!(status = %result.status, second, "ffmpeg exited with failure");
        } else {
            debug!(second, output = %output.display(), "ffmpeg finished");
        }
        Ok(())
    }
}

/// Parses ffprobe's `format=duration` value, truncating to whole seconds.
pub fn parse_duration_output(stdout: &str) -> Option<u64> {
    let seconds: f64 = stdout.lines().next()?.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(seconds.trunc() as u64)
}
