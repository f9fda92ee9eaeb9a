//! Provider request/response types.

use serde::{Deserialize, Serialize};
use vforge_models::Orientation;

/// One downloadable rendition of a stock video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFile {
    pub link: String,
    /// MIME type, e.g. "video/mp4"
    pub file_type: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl VideoFile {
    pub fn is_mp4(&self) -> bool {
        self.file_type.eq_ignore_ascii_case("video/mp4")
    }
}

/// A stock video returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub id: String,
    pub duration_seconds: f64,
    pub files: Vec<VideoFile>,
    #[serde(default)]
    pub preview_image_url: Option<String>,
}

impl VideoCandidate {
    /// MP4 rendition whose width is closest to `preferred_width`.
    ///
    /// Falls back to the first file when no MP4 exists.
    pub fn best_file(&self, preferred_width: u32) -> Option<&VideoFile> {
        self.files
            .iter()
            .filter(|f| f.is_mp4())
            .min_by_key(|f| {
                f.width
                    .map(|w| w.abs_diff(preferred_width))
                    .unwrap_or(u32::MAX)
            })
            .or_else(|| self.files.first())
    }
}

/// Synthesized narration.
#[derive(Clone, PartialEq)]
pub struct NarrationAudio {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl NarrationAudio {
    /// File extension matching the content type.
    pub fn extension(&self) -> &'static str {
        let mime = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/ogg" | "audio/opus" => "ogg",
            "audio/mp4" | "audio/aac" | "audio/x-m4a" => "m4a",
            "audio/webm" => "webm",
            _ => "mp3",
        }
    }
}

impl std::fmt::Debug for NarrationAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationAudio")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Pixel size requested from an image generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn for_orientation(orientation: Orientation) -> Self {
        let (width, height) = orientation.frame_size();
        Self { width, height }
    }

    /// Portrait size accepted by image-to-video models.
    pub fn portrait_720() -> Self {
        Self {
            width: 720,
            height: 1280,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedClip {
    pub url: String,
    pub duration_seconds: f64,
}

/// Clip lengths an image-to-video model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationBucket {
    Five,
    Ten,
    Fifteen,
}

impl DurationBucket {
    /// Smallest bucket covering a scene: up to 7 s, up to 12 s, longer.
    pub fn for_scene_seconds(seconds: f64) -> Self {
        if seconds <= 7.0 {
            DurationBucket::Five
        } else if seconds <= 12.0 {
            DurationBucket::Ten
        } else {
            DurationBucket::Fifteen
        }
    }

    pub fn seconds(&self) -> u32 {
        match self {
            DurationBucket::Five => 5,
            DurationBucket::Ten => 10,
            DurationBucket::Fifteen => 15,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationBucket::Five => "5",
            DurationBucket::Ten => "10",
            DurationBucket::Fifteen => "15",
        }
    }
}
