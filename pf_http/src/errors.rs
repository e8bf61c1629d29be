use pf_ratelimit::RateLimitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    #[error("Missing API credential: set {0}")]
    MissingCredential(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
}

impl FetchError {
    /// True when the shared request budget, not the provider, refused the call
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, FetchError::RateLimit(err) if err.is_quota_exceeded())
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
