//! Shared data models for the VForge scene assembly engine.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and emotional tones
//! - Resolved visual assets, motion effects and sourcing modes
//! - The fixed segment encoding profile
//! - Progress snapshots and the final assembled output

pub mod asset;
pub mod encoding;
pub mod output;
pub mod progress;
pub mod scene;

// Re-export common types
pub use asset::{
    loop_plan, ClipAsset, ImageAsset, ModeParseError, MotionEffect, Orientation, ResolvedAsset,
    VisualMode,
};
pub use encoding::EncodingConfig;
pub use output::{FinalAsset, RunId, MP4_CONTENT_TYPE};
pub use progress::{AssemblyProgress, AssemblyStage};
pub use scene::{
    is_contiguous, round_duration, total_duration, EmotionalTone, Scene, ToneParseError,
    DEFAULT_VISUAL_INTENT,
};
