use std::path::Path;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use pf_http::HttpClientConfig;
use pf_http::TiingoClient;
use pf_http::TiingoClientBuilder;
use pf_ratelimit::RateLimiterConfig;
use pf_ratelimit::RetryPolicy;
use pf_ratelimit::providers::market_data;
use serde::Deserialize;
use tracing::Level;

/// Prefix of environment overrides, e.g. `PF__RATE_LIMIT__REQUESTS_PER_HOUR=500`
pub const ENV_PREFIX: &str = "PF";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub requests_per_hour: u32,
    pub requests_per_day: u32,
    /// Fraction of quota remaining at which warnings start
    pub warning_threshold_percent: f64,
    /// Longest a single fetch waits for quota; `None` waits indefinitely
    pub max_wait_secs: Option<u64>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            requests_per_hour: market_data::STANDARD_REQUESTS_PER_HOUR,
            requests_per_day: market_data::STANDARD_REQUESTS_PER_DAY,
            warning_threshold_percent: 0.1,
            max_wait_secs: Some(300),
        }
    }
}

impl RateLimitSettings {
    pub fn limiter_config(&self) -> pf_ratelimit::Result<RateLimiterConfig> {
        RateLimiterConfig::builder()
            .per_hour(self.requests_per_hour)
            .per_day(self.requests_per_day)
            .warning_threshold(self.warning_threshold_percent)
            .build()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match self.max_wait_secs {
            Some(secs) => RetryPolicy::with_max_wait(Duration::from_secs(secs)),
            None => RetryPolicy::unbounded(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Environment variable holding the API token
    pub api_key_env: String,
    pub lookback_days: u32,
    pub request_timeout_secs: u64,
    /// Fail fetches instead of substituting synthetic data when no key is set
    pub require_credentials: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.tiingo.com".to_string(),
            api_key_env: pf_http::tiingo::DEFAULT_API_KEY_ENV.to_string(),
            lookback_days: pf_http::tiingo::DEFAULT_LOOKBACK_DAYS,
            request_timeout_secs: 30,
            require_credentials: false,
        }
    }
}

impl ProviderSettings {
    pub fn client_builder(&self) -> TiingoClientBuilder {
        TiingoClient::builder()
            .base_url(self.base_url.as_str())
            .api_key_env(self.api_key_env.as_str())
            .lookback_days(self.lookback_days)
            .require_credentials(self.require_credentials)
            .http_config(HttpClientConfig::default().with_request_timeout(Duration::from_secs(self.request_timeout_secs)))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset
    pub level: String,
    /// Directory for hourly rolling log files; stdout only when unset
    pub log_dir: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_string(), log_dir: None }
    }
}

impl LoggingSettings {
    /// Parsed level, falling back to `INFO` for unknown names
    pub fn level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rate_limit: RateLimitSettings,
    pub provider: ProviderSettings,
    pub logging: LoggingSettings,
    /// Annual risk-free rate as a fraction, used for the Sharpe ratio
    pub risk_free_rate: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitSettings::default(),
            provider: ProviderSettings::default(),
            logging: LoggingSettings::default(),
            risk_free_rate: 0.02,
        }
    }
}

/// Load configuration from an optional file plus `PF__` environment overrides
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }

    let config = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true)).build()?;

    config.try_deserialize()
}
