use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One object in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Final path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Extension of the final path segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        split_extension(&self.key).1
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Splits `path` into everything before the last extension of its final segment
/// and the extension itself. Dots in directory names are not extensions.
pub fn split_extension(path: &str) -> (&str, Option<&str>) {
    let segment_start = path.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    match path[segment_start..].rfind('.') {
        Some(0) | None => (path, None),
        Some(dot) => {
            let dot = segment_start + dot;
            (&path[..dot], Some(&path[dot + 1..]))
        }
    }
}

/// A video object and its local copy for probing and extraction.
#[derive(Debug, Clone)]
pub struct VideoSource {
    pub object: ObjectRef,
    pub local_path: PathBuf,
}

/// One extracted frame awaiting upload.
#[derive(Debug, Clone)]
pub struct ThumbnailArtifact {
    pub timestamp: u64,
    pub ordinal: usize,
    pub local_path: PathBuf,
    pub key: String,
}

/// An image object, fully buffered so every variant reads its own copy.
#[derive(Debug, Clone)]
pub struct ImageSource {
    pub object: ObjectRef,
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    Jpeg,
    Webp,
}

impl ImageEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpeg",
            ImageEncoding::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
            ImageEncoding::Webp => "image/webp",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            ImageEncoding::Jpeg => image::ImageFormat::Jpeg,
            ImageEncoding::Webp => image::ImageFormat::WebP,
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One derived image ready for upload.
#[derive(Debug, Clone)]
pub struct ResizedArtifact {
    pub width: u32,
    pub encoding: ImageEncoding,
    pub key: String,
    pub data: Bytes,
}

impl ResizedArtifact {
    pub fn content_type(&self) -> &'static str {
        self.encoding.content_type()
    }
}
