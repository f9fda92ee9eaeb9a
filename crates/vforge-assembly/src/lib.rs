//! Scene-based video assembly.
//!
//! This crate provides:
//! - Script segmentation into timed scenes
//! - Per-scene asset resolution through pluggable providers
//! - The assembly orchestrator (render, concatenate, mux, export)
//! - Progress reporting, configuration and structured run logging

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod segmenter;

pub use config::{AssemblyConfig, DriftPolicy, SceneConstraints};
pub use error::{AssemblyError, AssemblyResult};
pub use logging::{init_tracing, RunLogger};
pub use orchestrator::{Assembler, AssemblyInput, NarrationInput, ResolvedScene};
pub use progress::{channel_sink, ProgressReporter, ProgressSink};
pub use resolver::{AssetResolver, PromptStyle};
pub use segmenter::{
    ai_image_scene_count, estimate_narration_seconds, plan_scenes, segment, segment_fixed,
    select_strategy, split_script, SplitStrategy, TextChunk,
};
