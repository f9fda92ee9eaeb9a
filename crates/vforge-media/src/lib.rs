#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and segment compositing.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Progress parsing from `-progress pipe:2`
//! - Cancellation and timeouts via tokio
//! - The [`MediaEngine`] abstraction with an FFmpeg-backed implementation
//! - Scene rendering, concatenation and audio muxing

pub mod command;
pub mod concat;
pub mod engine;
pub mod error;
pub mod filters;
pub mod mux;
pub mod probe;
pub mod progress;
pub mod render;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::concatenate;
pub use engine::{validate_file_name, FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use mux::mux_audio;
pub use probe::{parse_probe_output, probe_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use render::{render_segment, segment_name, SegmentInput};
