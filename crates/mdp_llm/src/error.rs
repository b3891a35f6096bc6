use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {status} {url}")]
    Http { status: u16, url: String, body: String },

    #[error("connection refused or unreachable: {0}")]
    Connection(String),

    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("response was not valid JSON: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("response did not contain a balanced JSON array")]
    NoJsonArray,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_) | Self::Network(_) | Self::Http { status: 500..=599, .. })
    }

    /// Whether exhausting retries on this error should surface as the
    /// "model unreachable" exit code rather than a generic failure.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_) | Self::Network(_))
    }
}
