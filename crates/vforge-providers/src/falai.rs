//! fal-style image generation and image-to-video client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, check_status, parse_http_url};
use crate::traits::{ImageAnimator, ImageGenerator};
use crate::types::{DurationBucket, GeneratedClip, GeneratedImage, ImageSize};

const ANIMATE_NEGATIVE_PROMPT: &str =
    "low resolution, error, worst quality, low quality, defects, shaky, jumpy";

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    prompt: &'a str,
    image_size: ImageSize,
    num_images: u32,
    enable_safety_checker: bool,
    output_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    images: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct ImageEntry {
    url: String,
}

#[derive(Debug, Deserialize)]
struct AnimateResponse {
    video: Option<VideoEntry>,
}

#[derive(Debug, Deserialize)]
struct VideoEntry {
    url: String,
}

/// Client for fal-hosted generation models.
pub struct FalClient {
    http: Client,
    image_endpoint: Url,
    animate_endpoint: Url,
    api_key: String,
    timeout_secs: u64,
}

impl FalClient {
    pub fn new(
        api_key: impl Into<String>,
        image_endpoint: &str,
        animate_endpoint: &str,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            image_endpoint: parse_http_url(image_endpoint)?,
            animate_endpoint: parse_http_url(animate_endpoint)?,
            api_key: api_key.into(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let api_key = config
            .fal_api_key
            .clone()
            .ok_or(ProviderError::MissingCredentials("FAL_API_KEY"))?;
        Self::new(
            api_key,
            &config.fal_image_url,
            &config.fal_animate_url,
            config.request_timeout,
        )
    }

    async fn post_json<B, R>(&self, endpoint: &Url, body: &B) -> ProviderResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(endpoint.clone())
            .header("Authorization", format!("Key {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))
    }
}

#[async_trait]
impl ImageGenerator for FalClient {
    async fn generate(&self, prompt: &str, size: ImageSize) -> ProviderResult<GeneratedImage> {
        debug!(width = size.width, height = size.height, "Generating image");

        let request = ImageRequest {
            prompt,
            image_size: size,
            num_images: 1,
            enable_safety_checker: true,
            output_format: "jpeg",
        };
        let response: ImageResponse = self.post_json(&self.image_endpoint, &request).await?;

        response
            .images
            .into_iter()
            .next()
            .map(|image| GeneratedImage { url: image.url })
            .ok_or_else(|| ProviderError::invalid_response("No image URL in response"))
    }
}

#[async_trait]
impl ImageAnimator for FalClient {
    async fn animate(
        &self,
        image_url: &str,
        prompt: &str,
        duration: DurationBucket,
        resolution: &str,
    ) -> ProviderResult<GeneratedClip> {
        debug!(duration = duration.as_str(), resolution, "Animating image");

        let request = json!({
            "prompt": prompt,
            "image_url": image_url,
            "resolution": resolution,
            "duration": duration.as_str(),
            "negative_prompt": ANIMATE_NEGATIVE_PROMPT,
            "enable_prompt_expansion": false,
            "enable_safety_checker": true,
        });
        let response: AnimateResponse = self.post_json(&self.animate_endpoint, &request).await?;

        response
            .video
            .map(|video| GeneratedClip {
                url: video.url,
                duration_seconds: duration.seconds() as f64,
            })
            .ok_or_else(|| ProviderError::invalid_response("No video URL in response"))
    }
}
