//! Run identifiers and the final assembled output.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// MIME type of every assembled output.
pub const MP4_CONTENT_TYPE: &str = "video/mp4";

/// Unique identifier for one assembly run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assembled MP4 (H.264 video, AAC audio), owned by the caller.
#[derive(Clone, PartialEq)]
pub struct FinalAsset {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// Probed duration of the muxed file, min(video, audio)
    pub duration_seconds: f64,
}

impl FinalAsset {
    pub fn mp4(bytes: Vec<u8>, duration_seconds: f64) -> Self {
        Self {
            bytes,
            content_type: MP4_CONTENT_TYPE.to_string(),
            duration_seconds,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the asset to disk.
    pub fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

impl fmt::Debug for FinalAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalAsset")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("content_type", &self.content_type)
            .field("duration_seconds", &self.duration_seconds)
            .finish()
    }
}
