use std::collections::HashSet;
use std::sync::Arc;

use pf_http::HistoryProvider;
use pf_http::synthetic_series;
use pf_ratelimit::RateLimiter;
use pf_ratelimit::RetryPolicy;
use pf_ratelimit::wrap_async;
use pf_types::Allocation;
use pf_types::Interval;
use pf_types::OptimizationMethod;
use pf_types::OptimizationResult;
use pf_types::PortfolioMetrics;
use pf_types::Series;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimizeError {
    #[error("no tickers provided")]
    NoTickers,
}

/// Inputs of one optimization run
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeParams {
    pub tickers: Vec<String>,
    pub interval: Interval,
    /// Report label only
    pub method: OptimizationMethod,
}

impl OptimizeParams {
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { tickers: tickers.into_iter().map(Into::into).collect(), interval: Interval::default(), method: OptimizationMethod::default() }
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_method(mut self, method: OptimizationMethod) -> Self {
        self.method = method;
        self
    }
}

/// Optimization result plus how each ticker's data was obtained
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationOutcome {
    pub method: OptimizationMethod,
    pub interval: Interval,
    #[serde(flatten)]
    pub result: OptimizationResult,
    /// Tickers priced from synthetic series
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallback_tickers: Vec<String>,
    /// Tickers the provider had no data for
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_tickers: Vec<String>,
}

/// Trim, upper-case and de-duplicate ticker identifiers, keeping first occurrences
pub fn normalize_tickers<S: AsRef<str>>(tickers: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .map(|ticker| ticker.as_ref().trim().to_ascii_uppercase())
        .filter(|ticker| !ticker.is_empty() && seen.insert(ticker.clone()))
        .collect()
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Equal shares rounded to cents, residue on the first asset so the total is 100
pub fn equal_weight_allocations(assets: &[String]) -> Vec<Allocation> {
    if assets.is_empty() {
        return Vec::new();
    }

    let share = round2(100.0 / assets.len() as f64);
    let first = round2(100.0 - share * (assets.len() - 1) as f64);

    assets
        .iter()
        .enumerate()
        .map(|(i, asset)| Allocation { asset: asset.clone(), allocation_percent: if i == 0 { first } else { share } })
        .collect()
}

/// Period returns of an equal-weight portfolio over the common tail of every series
fn portfolio_returns(series: &[Series]) -> Vec<f64> {
    let per_asset: Vec<Vec<f64>> = series.iter().map(Series::returns).collect();
    let periods = per_asset.iter().map(Vec::len).min().unwrap_or(0);
    if periods == 0 {
        return Vec::new();
    }

    (0..periods)
        .map(|i| per_asset.iter().map(|returns| returns[returns.len() - periods + i]).sum::<f64>() / per_asset.len() as f64)
        .collect()
}

/// Annualised mean, volatility and Sharpe ratio of the equal-weight portfolio, in percent
///
/// `risk_free_rate` is an annual fraction. The Sharpe ratio is omitted when the
/// portfolio has no measurable volatility.
pub fn portfolio_metrics(series: &[Series], interval: Interval, risk_free_rate: f64) -> PortfolioMetrics {
    let returns = portfolio_returns(series);
    if returns.is_empty() {
        return PortfolioMetrics { expected_return: 0.0, risk: 0.0, sharpe_ratio: None };
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

    let periods = interval.periods_per_year();
    let expected_return = mean * periods * 100.0;
    let risk = variance.sqrt() * periods.sqrt() * 100.0;
    let sharpe_ratio = (risk > 0.0).then(|| round2((expected_return - risk_free_rate * 100.0) / risk));

    PortfolioMetrics { expected_return: round2(expected_return), risk: round2(risk), sharpe_ratio }
}

/// Fetches history for a basket of tickers through a shared rate limiter
pub struct Optimizer {
    provider: Arc<dyn HistoryProvider>,
    limiter: Arc<dyn RateLimiter>,
    policy: RetryPolicy,
    risk_free_rate: f64,
}

impl Optimizer {
    pub fn new(provider: Arc<dyn HistoryProvider>, limiter: Arc<dyn RateLimiter>) -> Self {
        Self { provider, limiter, policy: RetryPolicy::default(), risk_free_rate: 0.0 }
    }

    /// Replace the retry policy used for every fetch
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Annual risk-free rate as a fraction
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.limiter
    }

    /// Fetch every ticker serially and build the result
    ///
    /// Only an empty ticker list fails. Per-ticker failures become synthetic series;
    /// once the quota is exhausted no further provider calls are made.
    pub async fn optimize(&self, params: &OptimizeParams) -> Result<OptimizationOutcome, OptimizeError> {
        let tickers = normalize_tickers(&params.tickers);
        if tickers.is_empty() {
            return Err(OptimizeError::NoTickers);
        }

        let interval = params.interval;
        let provider = self.provider.as_ref();
        let fetch = wrap_async(Arc::clone(&self.limiter), move |ticker: String| provider.fetch_series(ticker, interval)).with_policy(self.policy);

        info!("Optimizing {} tickers ({}, {}) via {}", tickers.len(), params.method, interval, provider.name());

        let mut series: Vec<Series> = Vec::with_capacity(tickers.len());
        let mut fallback_tickers = Vec::new();
        let mut skipped_tickers = Vec::new();
        let mut quota_warning = None;

        for ticker in &tickers {
            if quota_warning.is_some() {
                fallback_tickers.push(ticker.clone());
                series.push(synthetic_series(ticker, interval));
                continue;
            }

            match fetch.call(ticker.clone()).await {
                Ok(fetched) if fetched.is_empty() => {
                    warn!("No data returned for {}, skipping", ticker);
                    skipped_tickers.push(ticker.clone());
                }
                Ok(fetched) => {
                    debug!("Fetched {} bars for {}", fetched.len(), ticker);
                    if fetched.is_synthetic() {
                        fallback_tickers.push(ticker.clone());
                    }
                    series.push(fetched);
                }
                Err(err) if err.is_quota_exceeded() => {
                    warn!("Quota exhausted at {}: {}", ticker, err);
                    quota_warning = Some(format!("{err}. No further requests were made."));
                    fallback_tickers.push(ticker.clone());
                    series.push(synthetic_series(ticker, interval));
                }
                Err(err) => {
                    warn!("Failed to fetch {}: {}, using fallback data", ticker, err);
                    fallback_tickers.push(ticker.clone());
                    series.push(synthetic_series(ticker, interval));
                }
            }
        }

        if series.is_empty() {
            warn!("No ticker returned data, using fallback data for all {}", tickers.len());
            skipped_tickers.clear();
            fallback_tickers = tickers.clone();
            series = tickers.iter().map(|ticker| synthetic_series(ticker, interval)).collect();
        }

        let mut warnings = Vec::new();
        if let Some(advisory) = self.limiter.check_thresholds() {
            warn!("{}", advisory);
            warnings.push(advisory);
        }
        warnings.extend(quota_warning);
        if !fallback_tickers.is_empty() {
            warnings.push(format!("Using synthetic data for: {}.", fallback_tickers.join(", ")));
        }

        let assets: Vec<String> = series.iter().map(|s| s.ticker.clone()).collect();
        let result = OptimizationResult {
            allocations: equal_weight_allocations(&assets),
            metrics: portfolio_metrics(&series, interval, self.risk_free_rate),
            efficient_frontier: None,
            warning: if warnings.is_empty() { None } else { Some(warnings.join(" ")) },
        };

        info!("Optimization complete: {} assets, {} on fallback data", assets.len(), fallback_tickers.len());

        Ok(OptimizationOutcome { method: params.method, interval, result, fallback_tickers, skipped_tickers })
    }
}
