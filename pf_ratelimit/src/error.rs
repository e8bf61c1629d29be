use std::fmt;
use std::time::Duration;

/// Result type for rate limiting operations
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Errors that can occur during rate limiting operations
///
/// The limiter itself never fails an admission check; denials are reported through
/// `PermissionResult`. These errors come from configuration and from bounded waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    /// Quota still exhausted after waiting as long as the retry policy allows
    QuotaExceeded {
        /// Total time spent sleeping before giving up
        waited: Duration,
        /// Delay the limiter asked for on the final denial
        retry_after: Duration,
    },

    /// Invalid configuration
    InvalidConfig(&'static str),
}

impl RateLimitError {
    /// True when the error signals an exhausted request budget
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, RateLimitError::QuotaExceeded { .. })
    }
}

impl fmt::Display for RateLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitError::QuotaExceeded { waited, retry_after } => write!(
                f,
                "API quota exceeded: waited {}ms, next slot in {}ms",
                waited.as_millis(),
                retry_after.as_millis()
            ),
            RateLimitError::InvalidConfig(msg) => write!(f, "Invalid rate limiter configuration: {}", msg),
        }
    }
}

impl std::error::Error for RateLimitError {}
