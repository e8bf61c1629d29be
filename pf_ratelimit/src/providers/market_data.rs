//! End-of-day market data presets
//!
//! The reference integration allows 2000 requests per hour and 48000 per day,
//! warning once 10% of either window remains.

use crate::QuotaLimiter;
use crate::RateLimiterConfig;
use crate::error::Result;

/// Requests per hour on the standard plan
pub const STANDARD_REQUESTS_PER_HOUR: u32 = 2_000;

/// Requests per day on the standard plan
pub const STANDARD_REQUESTS_PER_DAY: u32 = 48_000;

/// Standard plan limits
pub fn standard_config() -> RateLimiterConfig {
    RateLimiterConfig { requests_per_hour: STANDARD_REQUESTS_PER_HOUR, requests_per_day: STANDARD_REQUESTS_PER_DAY, warning_threshold_percent: 0.1 }
}

/// Limiter on the wall clock with standard plan limits
pub fn standard() -> QuotaLimiter {
    QuotaLimiter::new(standard_config())
}

/// Free plan limits: 50 requests per hour, 1000 per day
pub fn free_tier() -> Result<QuotaLimiter> {
    Ok(QuotaLimiter::new(RateLimiterConfig::new(50, 1_000)?))
}

/// Custom limits keeping the standard warning threshold
pub fn custom(requests_per_hour: u32, requests_per_day: u32) -> Result<QuotaLimiter> {
    Ok(QuotaLimiter::new(RateLimiterConfig::new(requests_per_hour, requests_per_day)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RateLimiter;

    #[test]
    fn test_standard_limits() {
        let limiter = standard();
        let usage = limiter.usage();

        assert_eq!(usage.hourly_limit, 2_000);
        assert_eq!(usage.daily_limit, 48_000);
        assert!(limiter.request_permission().is_allowed());
    }

    #[test]
    fn test_standard_warning_threshold() {
        let config = standard_config();

        assert_eq!(config.warning_threshold_percent(), 0.1);
        assert_eq!(config.warn_at(config.requests_per_hour()), 1_800);
    }

    #[test]
    fn test_free_tier() {
        let limiter = free_tier().unwrap();
        assert_eq!(limiter.usage().hourly_limit, 50);
    }

    #[test]
    fn test_custom_rejects_zero() {
        assert!(custom(0, 10).is_err());
        assert!(custom(10, 100).is_ok());
    }
}
