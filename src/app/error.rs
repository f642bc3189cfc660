use serde::Serialize;
use thiserror::Error;

use crate::infra::storage::StorageError;

/// One variant upload that did not complete.
#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub key: String,
    pub reason: String,
    pub timed_out: bool,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to fetch source object: {0}")]
    Fetch(#[source] StorageError),

    #[error("failed to decode source image: {0}")]
    Decode(String),

    #[error("failed to produce variant {key}: {message}")]
    Transform { key: String, message: String },

    #[error("{} of {total} uploads failed", .failures.len())]
    Uploads {
        total: usize,
        failures: Vec<UploadFailure>,
    },

    #[error("background task failed: {0}")]
    Task(String),
}

impl JobError {
    /// Timeouts are the only failures worth another delivery.
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Fetch(StorageError::Timeout) => true,
            JobError::Uploads { failures, .. } => failures.iter().any(|f| f.timed_out),
            _ => false,
        }
    }
}

impl From<tokio::task::JoinError> for JobError {
    fn from(err: tokio::task::JoinError) -> Self {
        JobError::Task(err.to_string())
    }
}
