//! Shared reqwest plumbing.

use std::time::Duration;

use reqwest::{Client, Response};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Longest error body kept in `RequestFailed`.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn build_client(timeout: Duration) -> ProviderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ProviderError::Network)
}

/// Parse a base URL so that relative joins append to its path.
pub(crate) fn parse_base_url(raw: &str) -> ProviderResult<Url> {
    let mut url = Url::parse(raw).map_err(|e| ProviderError::InvalidUrl(format!("{raw}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

pub(crate) fn join(base: &Url, path: &str) -> ProviderResult<Url> {
    base.join(path)
        .map_err(|e| ProviderError::InvalidUrl(format!("{base}{path}: {e}")))
}

/// Accept only absolute http(s) URLs.
pub(crate) fn parse_http_url(raw: &str) -> ProviderResult<Url> {
    let url = Url::parse(raw).map_err(|e| ProviderError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProviderError::InvalidUrl(format!(
            "unsupported scheme '{other}' in {raw}"
        ))),
    }
}

/// Turn a non-success response into `RequestFailed`.
pub(crate) async fn check_status(response: Response) -> ProviderResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }

    Err(ProviderError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}
