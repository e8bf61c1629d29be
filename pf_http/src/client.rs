use std::time::Duration;

use reqwest::Client;
use reqwest::ClientBuilder;
use reqwest::IntoUrl;

use crate::errors::Result;

const DEFAULT_USER_AGENT: &str = concat!("pf_optimize/", env!("CARGO_PKG_VERSION"));

/// Configuration for the provider HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Maximum idle connections per host (default: 8)
    pub pool_max_idle_per_host: usize,

    /// Idle timeout for connections (default: 90s)
    pub pool_idle_timeout: Duration,

    /// Connection establishment timeout (default: 10s)
    pub connect_timeout: Duration,

    /// Total request timeout (default: 30s)
    pub request_timeout: Duration,

    /// TCP keepalive interval (default: 60s)
    pub tcp_keepalive: Duration,

    /// Value of the `User-Agent` header
    pub user_agent: String,

    /// Enable Hickory DNS for async resolution (default: true)
    pub hickory_dns: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            pool_max_idle_per_host: 8,
            pool_idle_timeout: Duration::from_secs(90),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            tcp_keepalive: Duration::from_secs(60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            hickory_dns: true,
        }
    }
}

impl HttpClientConfig {
    /// Longer timeouts for large multi-year history downloads.
    pub fn patient() -> Self {
        Self { connect_timeout: Duration::from_secs(20), request_timeout: Duration::from_secs(120), ..Default::default() }
    }

    /// Override the total request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Pooled HTTPS client shared by every provider request
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let builder = ClientBuilder::new()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .tcp_keepalive(Some(config.tcp_keepalive))
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            // Price histories compress well
            .gzip(true)
            .brotli(true)
            .hickory_dns(config.hickory_dns);

        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Create a GET request builder
    pub fn get<U: IntoUrl>(&self, url: U) -> reqwest::RequestBuilder {
        self.client.get(url)
    }
}
