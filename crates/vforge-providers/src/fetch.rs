//! Plain HTTP asset downloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::http::{build_client, check_status, parse_http_url};
use crate::traits::AssetFetcher;

/// Downloads stock clips and generated media over HTTP(S).
pub struct HttpFetcher {
    http: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            timeout_secs: timeout.as_secs(),
        })
    }

    pub fn from_config(config: &ProviderConfig) -> ProviderResult<Self> {
        Self::new(config.request_timeout)
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> ProviderResult<Vec<u8>> {
        let url = parse_http_url(uri)?;
        debug!(url = %url, "Downloading asset");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;
        let response = check_status(response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_secs))?;

        if bytes.is_empty() {
            return Err(ProviderError::invalid_response(format!("Empty body from {uri}")));
        }

        debug!(bytes = bytes.len(), "Downloaded asset");
        Ok(bytes.to_vec())
    }
}
