//! Capability traits implemented by external services.

use async_trait::async_trait;
use vforge_models::Orientation;

use crate::error::ProviderResult;
use crate::types::{
    DurationBucket, GeneratedClip, GeneratedImage, ImageSize, NarrationAudio, VideoCandidate,
};

/// Text-to-speech.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Full-length synthesis.
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        engine_tier: Option<&str>,
    ) -> ProviderResult<NarrationAudio>;

    /// Short voice sample.
    async fn preview(&self, text: &str, voice_id: &str) -> ProviderResult<NarrationAudio>;
}

/// Stock video search.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        orientation: Orientation,
        page_size: u32,
    ) -> ProviderResult<Vec<VideoCandidate>>;

    /// Curated pool used when a search comes back empty.
    async fn popular(&self, page_size: u32) -> ProviderResult<Vec<VideoCandidate>>;
}

/// Text-to-image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, size: ImageSize) -> ProviderResult<GeneratedImage>;
}

/// Image-to-video.
#[async_trait]
pub trait ImageAnimator: Send + Sync {
    async fn animate(
        &self,
        image_url: &str,
        prompt: &str,
        duration: DurationBucket,
        resolution: &str,
    ) -> ProviderResult<GeneratedClip>;
}

/// Downloads asset bytes by URI.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> ProviderResult<Vec<u8>>;
}
