//! HTTP text-to-speech backend client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, check_status, join, parse_base_url};
use crate::traits::Narrator;
use crate::types::NarrationAudio;

const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    engine: Option<&'a str>,
}

/// Client for a TTS backend exposing `/synthesize` and `/preview`.
pub struct HttpNarrator {
    http: Client,
    base_url: Url,
    synthesis_timeout: Duration,
    preview_timeout: Duration,
}

impl HttpNarrator {
    pub fn new(base_url: &str, synthesis_timeout: Duration, preview_timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: build_client(synthesis_timeout)?,
            base_url: parse_base_url(base_url)?,
            synthesis_timeout,
            preview_timeout,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        let base_url = config
            .tts_base_url
            .as_deref()
            .ok_or(ProviderError::MissingCredentials("TTS_BASE_URL"))?;
        Self::new(base_url, config.request_timeout, config.preview_timeout)
    }

    async fn post_for_audio(
        &self,
        path: &str,
        request: &SynthesizeRequest<'_>,
        timeout: Duration,
    ) -> ProviderResult<NarrationAudio> {
        let url = join(&self.base_url, path)?;
        let timeout_secs = timeout.as_secs();
        debug!(url = %url, voice_id = request.voice_id, chars = request.text.len(), "Requesting narration");

        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, timeout_secs))?;

        let response = check_status(response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, timeout_secs))?;

        if bytes.is_empty() {
            return Err(ProviderError::invalid_response("Empty audio body"));
        }

        Ok(NarrationAudio {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[async_trait]
impl Narrator for HttpNarrator {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        engine_tier: Option<&str>,
    ) -> ProviderResult<NarrationAudio> {
        let request = SynthesizeRequest {
            text,
            voice_id,
            engine: engine_tier,
        };
        self.post_for_audio("synthesize", &request, self.synthesis_timeout)
            .await
    }

    async fn preview(&self, text: &str, voice_id: &str) -> ProviderResult<NarrationAudio> {
        let request = SynthesizeRequest {
            text,
            voice_id,
            engine: None,
        };
        self.post_for_audio("preview", &request, self.preview_timeout)
            .await
    }
}
