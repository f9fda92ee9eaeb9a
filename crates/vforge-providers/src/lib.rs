//! External capabilities used by scene assembly.
//!
//! Each capability is an async trait so the assembly core never depends on a
//! particular vendor. HTTP clients are provided for:
//! - Stock video search (Pexels-compatible API)
//! - Image generation and image-to-video (fal-hosted models)
//! - Narration synthesis (TTS backend with `/synthesize` and `/preview`)
//! - Plain asset downloads

pub mod config;
pub mod error;
pub mod falai;
pub mod fetch;
mod http;
pub mod narration;
pub mod pexels;
pub mod traits;
pub mod types;

pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use falai::FalClient;
pub use fetch::HttpFetcher;
pub use narration::HttpNarrator;
pub use pexels::PexelsClient;
pub use traits::{AssetFetcher, ImageAnimator, ImageGenerator, Narrator, VideoSearch};
pub use types::{
    DurationBucket, GeneratedClip, GeneratedImage, ImageSize, NarrationAudio, VideoCandidate,
    VideoFile,
};
