//! Resolved visual assets and their sourcing modes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::scene::round_duration;

/// Output orientation of the assembled video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    }

    /// Preferred source width when choosing among stock renditions.
    pub fn preferred_width(&self) -> u32 {
        match self {
            Orientation::Landscape => 1920,
            Orientation::Portrait => 1080,
        }
    }

    /// Output frame size (width, height).
    pub fn frame_size(&self) -> (u32, u32) {
        match self {
            Orientation::Landscape => (1920, 1080),
            Orientation::Portrait => (1080, 1920),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

/// Visual sourcing strategy for one assembly run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisualMode {
    /// Searchable stock footage, looped or trimmed to the scene
    #[default]
    StockClip,
    /// Generated stills animated with synthetic camera motion
    AiImage,
    /// Generated stills turned into short clips by an image-to-video service
    AiClip,
}

impl VisualMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualMode::StockClip => "stock_clip",
            VisualMode::AiImage => "ai_image",
            VisualMode::AiClip => "ai_clip",
        }
    }
}

impl fmt::Display for VisualMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VisualMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "stock_clip" | "stock" => Ok(VisualMode::StockClip),
            "ai_image" | "image" => Ok(VisualMode::AiImage),
            "ai_clip" => Ok(VisualMode::AiClip),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown mode: {0}")]
pub struct ModeParseError(String);

/// Synthetic camera motion applied to a still image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MotionEffect {
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
    DiagonalPan,
    ZoomInPanRight,
    SlowZoomRotate,
    FadeInZoom,
    BounceZoom,
    CircularPan,
}

impl MotionEffect {
    /// Fixed palette, in assignment order.
    pub const PALETTE: &'static [MotionEffect] = &[
        MotionEffect::ZoomIn,
        MotionEffect::ZoomOut,
        MotionEffect::PanLeft,
        MotionEffect::PanRight,
        MotionEffect::PanUp,
        MotionEffect::PanDown,
        MotionEffect::DiagonalPan,
        MotionEffect::ZoomInPanRight,
        MotionEffect::SlowZoomRotate,
        MotionEffect::FadeInZoom,
        MotionEffect::BounceZoom,
        MotionEffect::CircularPan,
    ];

    /// Round-robin effect for a zero-based scene index.
    pub fn for_scene(scene_index: usize) -> Self {
        Self::PALETTE[scene_index % Self::PALETTE.len()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            MotionEffect::ZoomIn => "Zoom In",
            MotionEffect::ZoomOut => "Zoom Out",
            MotionEffect::PanLeft => "Pan Left",
            MotionEffect::PanRight => "Pan Right",
            MotionEffect::PanUp => "Pan Up",
            MotionEffect::PanDown => "Pan Down",
            MotionEffect::DiagonalPan => "Diagonal Pan",
            MotionEffect::ZoomInPanRight => "Zoom In + Pan Right",
            MotionEffect::SlowZoomRotate => "Slow Zoom with Rotation",
            MotionEffect::FadeInZoom => "Fade In + Zoom",
            MotionEffect::BounceZoom => "Bounce Zoom",
            MotionEffect::CircularPan => "Circular Pan",
        }
    }
}

impl fmt::Display for MotionEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stock or generated footage to be looped/trimmed to the scene duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipAsset {
    pub source_uri: String,
    /// Upstream identifier, used for de-duplication across a batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub source_duration_seconds: f64,
    pub needs_looping: bool,
    pub loop_count: u32,
}

impl ClipAsset {
    /// Build a clip asset, deriving looping from the scene duration.
    ///
    /// Segments are trimmed to whole seconds, so looping is planned against
    /// the rounded scene duration.
    pub fn fitted(
        source_uri: impl Into<String>,
        source_id: Option<String>,
        source_duration_seconds: f64,
        scene_duration_seconds: f64,
    ) -> Self {
        let target = round_duration(scene_duration_seconds) as f64;
        let (needs_looping, loop_count) = loop_plan(source_duration_seconds, target);
        Self {
            source_uri: source_uri.into(),
            source_id,
            source_duration_seconds,
            needs_looping,
            loop_count,
        }
    }
}

/// Compute `(needs_looping, loop_count)` for a source against a scene duration.
///
/// Unknown (non-positive) source durations are treated as long enough.
pub fn loop_plan(source_duration_seconds: f64, scene_duration_seconds: f64) -> (bool, u32) {
    if !(source_duration_seconds > 0.0) || !scene_duration_seconds.is_finite() {
        return (false, 1);
    }
    let needs_looping = source_duration_seconds < scene_duration_seconds;
    let loop_count = (scene_duration_seconds / source_duration_seconds).ceil().max(1.0) as u32;
    (needs_looping, loop_count)
}

/// Still image animated with a motion effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub source_uri: String,
    pub motion_effect: MotionEffect,
}

/// Visual material chosen or generated for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedAsset {
    Clip(ClipAsset),
    Image(ImageAsset),
}

impl ResolvedAsset {
    pub fn source_uri(&self) -> &str {
        match self {
            ResolvedAsset::Clip(clip) => &clip.source_uri,
            ResolvedAsset::Image(image) => &image.source_uri,
        }
    }

    pub fn is_clip(&self) -> bool {
        matches!(self, ResolvedAsset::Clip(_))
    }
}
