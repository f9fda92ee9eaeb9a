//! Pexels-style stock video search client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use vforge_models::Orientation;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, check_status, join, parse_base_url};
use crate::traits::VideoSearch;
use crate::types::{VideoCandidate, VideoFile};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    video_files: Vec<PexelsVideoFile>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    link: String,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

impl From<PexelsVideo> for VideoCandidate {
    fn from(video: PexelsVideo) -> Self {
        Self {
            id: video.id.to_string(),
            duration_seconds: video.duration,
            files: video
                .video_files
                .into_iter()
                .map(|f| VideoFile {
                    link: f.link,
                    file_type: f.file_type.unwrap_or_default(),
                    width: f.width,
                    height: f.height,
                })
                .collect(),
            preview_image_url: video.image,
        }
    }
}

/// Client for a Pexels-compatible video API.
pub struct PexelsClient {
    http: Client,
    base_url: Url,
    api_key: String,
    timeout_secs: u64,
}

impl PexelsClient {
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: parse_base_url(base_url)?,
            api_key: api_key.into(),
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let api_key = config
            .pexels_api_key
            .clone()
            .ok_or(ProviderError::MissingCredentials("PEXELS_API_KEY"))?;
        Self::new(api_key, &config.pexels_base_url, config.request_timeout)
    }

    async fn get_videos(&self, path: &str, query: &[(&str, String)]) -> ProviderResult<Vec<VideoCandidate>> {
        let url = join(&self.base_url, path)?;
        debug!(url = %url, "Querying stock videos");

        let response = self
            .http
            .get(url)
            .header("Authorization", &self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        let response = check_status(response).await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        Ok(body.videos.into_iter().map(VideoCandidate::from).collect())
    }
}

#[async_trait]
impl VideoSearch for PexelsClient {
    async fn search(
        &self,
        query: &str,
        orientation: Orientation,
        page_size: u32,
    ) -> ProviderResult<Vec<VideoCandidate>> {
        self.get_videos(
            "videos/search",
            &[
                ("query", query.to_string()),
                ("orientation", orientation.as_str().to_string()),
                ("size", "medium".to_string()),
                ("per_page", page_size.to_string()),
                ("page", "1".to_string()),
            ],
        )
        .await
    }

    async fn popular(&self, page_size: u32) -> ProviderResult<Vec<VideoCandidate>> {
        self.get_videos("videos/popular", &[("per_page", page_size.to_string())])
            .await
    }
}
