//! Provider configuration.

use std::time::Duration;

pub const DEFAULT_PEXELS_BASE_URL: &str = "https://api.pexels.com";
pub const DEFAULT_FAL_IMAGE_URL: &str = "https://fal.run/fal-ai/flux-pro/v1.1-ultra";
pub const DEFAULT_FAL_ANIMATE_URL: &str = "https://fal.run/wan/v2.6/image-to-video/flash";

/// Timeout for synthesis, generation, search and downloads.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
/// Timeout for voice previews.
pub const DEFAULT_PREVIEW_TIMEOUT_SECS: u64 = 30;

/// Credentials and endpoints for every external provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub pexels_api_key: Option<String>,
    pub pexels_base_url: String,
    pub fal_api_key: Option<String>,
    pub fal_image_url: String,
    pub fal_animate_url: String,
    /// Base URL of the TTS backend
    pub tts_base_url: Option<String>,
    pub request_timeout: Duration,
    pub preview_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            pexels_api_key: None,
            pexels_base_url: DEFAULT_PEXELS_BASE_URL.to_string(),
            fal_api_key: None,
            fal_image_url: DEFAULT_FAL_IMAGE_URL.to_string(),
            fal_animate_url: DEFAULT_FAL_ANIMATE_URL.to_string(),
            tts_base_url: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            preview_timeout: Duration::from_secs(DEFAULT_PREVIEW_TIMEOUT_SECS),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            pexels_api_key: non_empty_var("PEXELS_API_KEY"),
            pexels_base_url: non_empty_var("PEXELS_BASE_URL").unwrap_or(defaults.pexels_base_url),
            fal_api_key: non_empty_var("FAL_API_KEY"),
            fal_image_url: non_empty_var("FAL_IMAGE_URL").unwrap_or(defaults.fal_image_url),
            fal_animate_url: non_empty_var("FAL_ANIMATE_URL").unwrap_or(defaults.fal_animate_url),
            tts_base_url: non_empty_var("TTS_BASE_URL"),
            request_timeout: Duration::from_secs(
                std::env::var("PROVIDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            preview_timeout: Duration::from_secs(
                std::env::var("PROVIDER_PREVIEW_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_PREVIEW_TIMEOUT_SECS),
            ),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ProviderConfig")
            .field("pexels_api_key", &redact(&self.pexels_api_key))
            .field("pexels_base_url", &self.pexels_base_url)
            .field("fal_api_key", &redact(&self.fal_api_key))
            .field("fal_image_url", &self.fal_image_url)
            .field("fal_animate_url", &self.fal_animate_url)
            .field("tts_base_url", &self.tts_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("preview_timeout", &self.preview_timeout)
            .finish()
    }
}
