use percent_encoding::percent_decode_str;
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::media::ObjectRef;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("notification has no records")]
    NoRecords,

    #[error("object key is not valid utf-8 after decoding: {0}")]
    InvalidKey(String),
}

/// Object storage "object created" notification.
#[derive(Debug, Clone, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3EventRecord {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub event_time: Option<OffsetDateTime>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl S3Event {
    /// The object this invocation owns: the first record's bucket and decoded key.
    pub fn source_object(&self) -> Result<ObjectRef, EventError> {
        let record = self.records.first().ok_or(EventError::NoRecords)?;
        if self.records.len() > 1 {
            tracing::warn!(
                records = self.records.len(),
                "notification carries several records, only the first is processed"
            );
        }

        let key = decode_object_key(&record.s3.object.key)?;
        Ok(ObjectRef::new(record.s3.bucket.name.clone(), key))
    }
}

/// Notification keys are form-encoded: spaces arrive as `+`, everything else
/// percent-encoded.
pub fn decode_object_key(raw: &str) -> Result<String, EventError> {
    let unplussed = raw.replace('+', " ");
    percent_decode_str(&unplussed)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|_| EventError::InvalidKey(raw.to_string()))
}
