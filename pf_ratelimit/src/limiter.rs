use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::error::RateLimitError;
use crate::error::Result;
use crate::wrap::RetryPolicy;

/// Outcome of a single admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionResult {
    /// Call admitted and recorded against both windows
    Allowed {
        /// Threshold advisory computed after recording the call
        warning: Option<String>,
    },
    /// Call refused; nothing was recorded
    Denied {
        /// Time until the blocking window frees a slot
        delay: Duration,
        warning: String,
    },
}

impl PermissionResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PermissionResult::Allowed { .. })
    }

    /// Suggested wait in milliseconds, present only on denial
    pub fn delay_ms(&self) -> Option<u64> {
        self.delay().map(|delay| delay.as_millis() as u64)
    }

    pub fn delay(&self) -> Option<Duration> {
        match self {
            PermissionResult::Allowed { .. } => None,
            PermissionResult::Denied { delay, .. } => Some(*delay),
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            PermissionResult::Allowed { warning } => warning.as_deref(),
            PermissionResult::Denied { warning, .. } => Some(warning),
        }
    }
}

/// Point-in-time view of consumed quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUsage {
    pub hourly: u32,
    pub hourly_limit: u32,
    pub daily: u32,
    pub daily_limit: u32,
}

impl QuotaUsage {
    pub fn hourly_remaining(&self) -> u32 {
        self.hourly_limit.saturating_sub(self.hourly)
    }

    pub fn daily_remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.daily)
    }
}

/// Core trait for admission control over a shared request budget
pub trait RateLimiter: Send + Sync {
    /// Check admission and, when allowed, consume one unit of every window
    fn request_permission(&self) -> PermissionResult;

    /// Report proximity to the limits without consuming quota
    fn check_thresholds(&self) -> Option<String>;

    /// Current usage of every window without consuming quota
    fn usage(&self) -> QuotaUsage;

    /// Wait until a call is admitted, sleeping for the suggested delay between checks
    ///
    /// Resolves to the admission warning, or to `QuotaExceeded` once the next sleep
    /// would take the total wait past `policy.max_wait`.
    fn acquire<'a>(&'a self, policy: &'a RetryPolicy) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>> {
        Box::pin(async move {
            let mut waited = Duration::ZERO;

            loop {
                let (delay, warning) = match self.request_permission() {
                    PermissionResult::Allowed { warning } => return Ok(warning),
                    PermissionResult::Denied { delay, warning } => (delay, warning),
                };

                // A zero delay would spin without letting any window age
                let delay = if delay.is_zero() { policy.fallback_delay } else { delay };

                if let Some(max_wait) = policy.max_wait {
                    if waited + delay > max_wait {
                        return Err(RateLimitError::QuotaExceeded { waited, retry_after: delay });
                    }
                }

                debug!("Rate limited ({warning}), retrying in {}ms", delay.as_millis());
                tokio::time::sleep(delay).await;
                waited += delay;
            }
        })
    }
}
