use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::RateLimitError;
use crate::error::Result;
use crate::limiter::PermissionResult;
use crate::limiter::QuotaUsage;
use crate::limiter::RateLimiter;
use crate::time::Clock;
use crate::time::SystemClock;
use crate::window::CallLog;
use crate::window::SlidingWindow;
use crate::window::WindowKind;

/// Safety margin added to every computed delay so the retry lands after expiry
pub const DELAY_BUFFER_MS: u64 = 100;

/// Fraction of quota remaining at which warnings start
pub const DEFAULT_WARNING_THRESHOLD: f64 = 0.1;

/// Limits for a dual-window quota limiter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimiterConfig {
    pub(crate) requests_per_hour: u32,
    pub(crate) requests_per_day: u32,
    pub(crate) warning_threshold_percent: f64,
}

impl RateLimiterConfig {
    /// Create a configuration with the default warning threshold
    pub fn new(requests_per_hour: u32, requests_per_day: u32) -> Result<Self> {
        Self::with_warning_threshold(requests_per_hour, requests_per_day, DEFAULT_WARNING_THRESHOLD)
    }

    /// Create a configuration with an explicit warning threshold in `[0, 1]`
    pub fn with_warning_threshold(requests_per_hour: u32, requests_per_day: u32, warning_threshold_percent: f64) -> Result<Self> {
        if requests_per_hour == 0 {
            return Err(RateLimitError::InvalidConfig("requests_per_hour must be greater than 0"));
        }
        if requests_per_day == 0 {
            return Err(RateLimitError::InvalidConfig("requests_per_day must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&warning_threshold_percent) {
            return Err(RateLimitError::InvalidConfig("warning_threshold_percent must be within [0, 1]"));
        }

        Ok(Self { requests_per_hour, requests_per_day, warning_threshold_percent })
    }

    /// Create a builder for configuring limits
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }

    pub fn requests_per_hour(&self) -> u32 {
        self.requests_per_hour
    }

    pub fn requests_per_day(&self) -> u32 {
        self.requests_per_day
    }

    pub fn warning_threshold_percent(&self) -> f64 {
        self.warning_threshold_percent
    }

    /// First count at which a window with `limit` reports "approaching"
    ///
    /// `ceil(limit * (1 - threshold))`, at least 1. The epsilon keeps products such as
    /// `100 * 0.9` from rounding up past the intended count.
    pub fn warn_at(&self, limit: u32) -> u32 {
        let raw = limit as f64 * (1.0 - self.warning_threshold_percent);
        (raw - 1e-9).ceil().max(1.0) as u32
    }

    fn call_log(&self) -> CallLog {
        CallLog::new(
            SlidingWindow::new(WindowKind::Hourly, self.requests_per_hour, self.warn_at(self.requests_per_hour)),
            SlidingWindow::new(WindowKind::Daily, self.requests_per_day, self.warn_at(self.requests_per_day)),
        )
    }
}

/// Builder for `RateLimiterConfig`
pub struct RateLimiterConfigBuilder {
    requests_per_hour: Option<u32>,
    requests_per_day: Option<u32>,
    warning_threshold_percent: f64,
}

impl RateLimiterConfigBuilder {
    pub fn new() -> Self {
        Self { requests_per_hour: None, requests_per_day: None, warning_threshold_percent: DEFAULT_WARNING_THRESHOLD }
    }

    /// Set the hourly ceiling
    pub fn per_hour(mut self, limit: u32) -> Self {
        self.requests_per_hour = Some(limit);
        self
    }

    /// Set the daily ceiling
    pub fn per_day(mut self, limit: u32) -> Self {
        self.requests_per_day = Some(limit);
        self
    }

    /// Warn once this fraction of a window's quota or less remains
    pub fn warning_threshold(mut self, percent: f64) -> Self {
        self.warning_threshold_percent = percent;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RateLimiterConfig> {
        let per_hour = self.requests_per_hour.ok_or(RateLimitError::InvalidConfig("requests_per_hour must be set"))?;
        let per_day = self.requests_per_day.ok_or(RateLimitError::InvalidConfig("requests_per_day must be set"))?;
        RateLimiterConfig::with_warning_threshold(per_hour, per_day, self.warning_threshold_percent)
    }
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sliding-window limiter enforcing an hourly and a daily ceiling at once
///
/// Every admitted call appends "now" to both windows under one lock, so each call
/// costs exactly one unit of both budgets even when the limiter is shared across
/// tasks. Expired entries are pruned lazily on each access.
pub struct QuotaLimiter<C: Clock = SystemClock> {
    config: RateLimiterConfig,
    log: Mutex<CallLog>,
    clock: C,
}

impl QuotaLimiter<SystemClock> {
    /// Create a limiter reading the wall clock
    pub fn new(config: RateLimiterConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> QuotaLimiter<C> {
    /// Create a limiter with a custom clock
    pub fn with_clock(config: RateLimiterConfig, clock: C) -> Self {
        Self { log: Mutex::new(config.call_log()), config, clock }
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

impl<C: Clock> RateLimiter for QuotaLimiter<C> {
    fn request_permission(&self) -> PermissionResult {
        let now = self.clock.now_ms();
        let mut log = self.log.lock();
        log.prune(now);

        for window in [&log.hourly, &log.daily] {
            if window.is_exhausted() {
                let delay = Duration::from_millis(window.delay_until_free(now, DELAY_BUFFER_MS));
                let warning = window.exceeded_message();
                debug!("Denied request: {warning}, delay {}ms", delay.as_millis());
                return PermissionResult::Denied { delay, warning };
            }
        }

        log.record(now);
        let warning = log.threshold_warning();
        if let Some(warning) = &warning {
            debug!("Admitted request near quota: {warning}");
        }

        PermissionResult::Allowed { warning }
    }

    fn check_thresholds(&self) -> Option<String> {
        let now = self.clock.now_ms();
        let mut log = self.log.lock();
        log.prune(now);
        log.threshold_warning()
    }

    fn usage(&self) -> QuotaUsage {
        let now = self.clock.now_ms();
        let mut log = self.log.lock();
        log.prune(now);

        QuotaUsage { hourly: log.hourly.count(), hourly_limit: log.hourly.limit(), daily: log.daily.count(), daily_limit: log.daily.limit() }
    }
}
