//! Provider error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Missing credentials: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No results for query: {0}")]
    NoResults(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Map a transport error, keeping timeouts distinct from other failures.
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout_secs)
        } else {
            ProviderError::Network(err)
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout(_))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::Network(_) | ProviderError::NoResults(_) => true,
            ProviderError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let throttled = ProviderError::RequestFailed { status: 429, body: String::new() };
        let server = ProviderError::RequestFailed { status: 503, body: String::new() };
        let bad_request = ProviderError::RequestFailed { status: 400, body: String::new() };

        assert!(throttled.is_retryable());
        assert!(server.is_retryable());
        assert!(!bad_request.is_retryable());
        assert!(!ProviderError::MissingCredentials("PEXELS_API_KEY").is_retryable());
        assert!(ProviderError::Timeout(120).is_timeout());
    }
}
