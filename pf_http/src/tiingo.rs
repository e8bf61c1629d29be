use std::env;
use std::future::Future;
use std::pin::Pin;

use pf_types::DataSource;
use pf_types::Interval;
use pf_types::PriceBar;
use pf_types::Series;
use reqwest::StatusCode;
use reqwest::Url;
use serde::Deserialize;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::debug;
use tracing::warn;

use crate::client::HttpClient;
use crate::client::HttpClientConfig;
use crate::errors::FetchError;
use crate::errors::Result;
use crate::fallback::synthetic_series;
use crate::provider::HistoryProvider;

const TIINGO_BASE_URL: &str = "https://api.tiingo.com";

/// Environment variable holding the API token
pub const DEFAULT_API_KEY_ENV: &str = "TIINGO_API_KEY";

/// How far back the history request starts by default
pub const DEFAULT_LOOKBACK_DAYS: u32 = 365;

/// End-of-day price client for the Tiingo REST API
pub struct TiingoClient {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    lookback_days: u32,
    require_credentials: bool,
}

impl TiingoClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a new client builder
    pub fn builder() -> TiingoClientBuilder {
        TiingoClientBuilder::default()
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    /// Daily bars for `ticker`, resampled to `interval`
    pub async fn prices(&self, ticker: &str, interval: Interval) -> Result<Series> {
        let Some(api_key) = self.api_key.as_deref() else {
            if self.require_credentials {
                return Err(FetchError::MissingCredential(self.api_key_env.clone()));
            }
            warn!("{} not set, using synthetic data for {}", self.api_key_env, ticker);
            return Ok(synthetic_series(ticker, interval));
        };

        let url = self.prices_url(ticker)?;
        let start_date = self.start_date()?;

        debug!("Fetching {} {} history from {}", ticker, interval, start_date);

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Token {api_key}"))
            .query(&[("startDate", start_date.as_str()), ("resampleFreq", interval.as_str())])
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return handle_error_response(ticker, interval, status, &bytes);
        }

        parse_prices(ticker, interval, &bytes)
    }

    /// `{base}/tiingo/daily/{ticker}/prices` with the ticker escaped as one path segment
    fn prices_url(&self, ticker: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["tiingo", "daily", ticker, "prices"]);
        Ok(url)
    }

    fn start_date(&self) -> Result<String> {
        let start = OffsetDateTime::now_utc().date() - time::Duration::days(self.lookback_days as i64);
        start.format(format_description!("[year]-[month]-[day]")).map_err(|e| FetchError::InvalidResponse(format!("cannot format start date: {e}")))
    }
}

impl HistoryProvider for TiingoClient {
    fn name(&self) -> &str {
        "tiingo"
    }

    fn fetch_series(&self, ticker: String, interval: Interval) -> Pin<Box<dyn Future<Output = Result<Series>> + Send + '_>> {
        Box::pin(async move { self.prices(&ticker, interval).await })
    }
}

/// Builder for configuring the Tiingo client
pub struct TiingoClientBuilder {
    http_config: HttpClientConfig,
    base_url: String,
    api_key: Option<String>,
    api_key_env: String,
    lookback_days: u32,
    require_credentials: bool,
}

impl Default for TiingoClientBuilder {
    fn default() -> Self {
        Self {
            http_config: HttpClientConfig::default(),
            base_url: TIINGO_BASE_URL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            require_credentials: false,
        }
    }
}

impl TiingoClientBuilder {
    /// Set custom base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Configure HTTP client settings
    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Use an explicit token instead of reading the environment
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Read the token from a different environment variable
    pub fn api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }

    /// Number of calendar days of history to request
    pub fn lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Fail with `MissingCredential` instead of substituting synthetic data
    pub fn require_credentials(mut self, required: bool) -> Self {
        self.require_credentials = required;
        self
    }

    /// Build the Tiingo client
    pub fn build(self) -> Result<TiingoClient> {
        let client = HttpClient::with_config(self.http_config)?;

        let api_key = self.api_key.or_else(|| env::var(&self.api_key_env).ok()).filter(|key| !key.trim().is_empty());

        Ok(TiingoClient {
            client,
            base_url: self.base_url,
            api_key,
            api_key_env: self.api_key_env,
            lookback_days: self.lookback_days,
            require_credentials: self.require_credentials,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TiingoPrice {
    #[serde(with = "time::serde::rfc3339")]
    date: OffsetDateTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    adj_close: f64,
    volume: f64,
}

impl From<TiingoPrice> for PriceBar {
    fn from(row: TiingoPrice) -> Self {
        PriceBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            adj_close: row.adj_close,
            volume: row.volume.max(0.0) as u64,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TiingoError {
    detail: String,
}

fn is_not_found(detail: &str) -> bool {
    detail.to_ascii_lowercase().contains("not found")
}

fn empty_series(ticker: &str, interval: Interval) -> Series {
    Series::new(ticker, interval, DataSource::Provider, Vec::new())
}

/// Decode a successful price response
///
/// Some error conditions come back with status 200 and a `detail` object, so that
/// shape is recognised here as well.
fn parse_prices(ticker: &str, interval: Interval, body: &[u8]) -> Result<Series> {
    match serde_json::from_slice::<Vec<TiingoPrice>>(body) {
        Ok(rows) => Ok(Series::new(ticker, interval, DataSource::Provider, rows.into_iter().map(PriceBar::from).collect())),
        Err(err) => match serde_json::from_slice::<TiingoError>(body) {
            Ok(error) if is_not_found(&error.detail) => Ok(empty_series(ticker, interval)),
            Ok(error) => Err(FetchError::InvalidResponse(error.detail)),
            Err(_) => Err(FetchError::Json(err)),
        },
    }
}

/// Map a non-2xx response: unknown tickers become an empty series
fn handle_error_response(ticker: &str, interval: Interval, status: StatusCode, body: &[u8]) -> Result<Series> {
    let detail = serde_json::from_slice::<TiingoError>(body).ok().map(|error| error.detail);

    if status == StatusCode::NOT_FOUND || detail.as_deref().is_some_and(is_not_found) {
        debug!("No data for {} ({})", ticker, status);
        return Ok(empty_series(ticker, interval));
    }

    Err(FetchError::ApiError { status: status.as_u16(), message: detail.unwrap_or_else(|| format!("HTTP {status}")) })
}
