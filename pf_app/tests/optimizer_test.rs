use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pf_app::OptimizeError;
use pf_app::OptimizeParams;
use pf_app::Optimizer;
use pf_http::FetchError;
use pf_http::HistoryProvider;
use pf_http::synthetic_series;
use pf_ratelimit::ManualClock;
use pf_ratelimit::QuotaLimiter;
use pf_ratelimit::RateLimiter;
use pf_ratelimit::RateLimiterConfig;
use pf_ratelimit::RetryPolicy;
use pf_types::DataSource;
use pf_types::Interval;
use pf_types::OptimizationMethod;
use pf_types::Series;

#[derive(Debug, Clone, Copy)]
enum Response {
    Prices,
    Empty,
    Fail,
}

/// Provider answering from a fixed table and recording every request
struct ScriptedProvider {
    responses: HashMap<String, Response>,
    calls: Mutex<Vec<(String, Interval)>>,
}

impl ScriptedProvider {
    fn new(responses: &[(&str, Response)]) -> Arc<Self> {
        Arc::new(Self { responses: responses.iter().map(|(t, r)| (t.to_string(), *r)).collect(), calls: Mutex::new(Vec::new()) })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(ticker, _)| ticker.clone()).collect()
    }

    fn intervals(&self) -> Vec<Interval> {
        self.calls.lock().iter().map(|(_, interval)| *interval).collect()
    }
}

impl HistoryProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_series(&self, ticker: String, interval: Interval) -> Pin<Box<dyn Future<Output = pf_http::Result<Series>> + Send + '_>> {
        Box::pin(async move {
            self.calls.lock().push((ticker.clone(), interval));
            match self.responses.get(&ticker).copied().unwrap_or(Response::Prices) {
                Response::Prices => Ok(Series { source: DataSource::Provider, ..synthetic_series(&ticker, interval) }),
                Response::Empty => Ok(Series::new(ticker, interval, DataSource::Provider, Vec::new())),
                Response::Fail => Err(FetchError::ApiError { status: 500, message: "upstream unavailable".to_string() }),
            }
        })
    }
}

fn limiter(per_hour: u32, per_day: u32) -> Arc<QuotaLimiter<ManualClock>> {
    let config = RateLimiterConfig::new(per_hour, per_day).unwrap();
    Arc::new(QuotaLimiter::with_clock(config, ManualClock::new(1_700_000_000_000)))
}

fn optimizer(provider: &Arc<ScriptedProvider>, limiter: &Arc<QuotaLimiter<ManualClock>>) -> Optimizer {
    Optimizer::new(provider.clone(), limiter.clone()).with_policy(RetryPolicy::with_max_wait(Duration::from_secs(1)))
}

#[tokio::test]
async fn test_all_tickers_fetched() {
    let provider = ScriptedProvider::new(&[]);
    let limiter = limiter(100, 1_000);
    let params = OptimizeParams::new(["AAPL", "MSFT", "GOOG"]).with_method(OptimizationMethod::MaximumSharpe);

    let outcome = optimizer(&provider, &limiter).optimize(&params).await.unwrap();

    assert_eq!(provider.calls(), vec!["AAPL", "MSFT", "GOOG"]);
    assert_eq!(provider.intervals(), vec![Interval::Daily; 3]);
    assert_eq!(limiter.usage().hourly, 3);
    assert_eq!(outcome.method, OptimizationMethod::MaximumSharpe);
    assert!(outcome.fallback_tickers.is_empty());
    assert_eq!(outcome.result.warning, None);
    assert_eq!(outcome.result.efficient_frontier, None);

    let assets: Vec<&str> = outcome.result.allocations.iter().map(|a| a.asset.as_str()).collect();
    assert_eq!(assets, vec!["AAPL", "MSFT", "GOOG"]);
    assert!(outcome.result.is_fully_allocated());
    assert!(outcome.result.metrics.risk > 0.0);
    assert!(outcome.result.metrics.sharpe_ratio.is_some());
}

#[tokio::test]
async fn test_tickers_normalized_before_fetching() {
    let provider = ScriptedProvider::new(&[]);
    let limiter = limiter(100, 1_000);
    let params = OptimizeParams::new([" aapl", "AAPL", "", "msft "]);

    optimizer(&provider, &limiter).optimize(&params).await.unwrap();

    assert_eq!(provider.calls(), vec!["AAPL", "MSFT"]);
}

#[tokio::test]
async fn test_no_tickers_is_rejected_before_fetching() {
    let provider = ScriptedProvider::new(&[]);
    let limiter = limiter(100, 1_000);

    let result = optimizer(&provider, &limiter).optimize(&OptimizeParams::new(["  ", ""])).await;

    assert_eq!(result.unwrap_err(), OptimizeError::NoTickers);
    assert!(provider.calls().is_empty());
    assert_eq!(limiter.usage().hourly, 0);
}

#[tokio::test]
async fn test_failed_ticker_uses_fallback() {
    let provider = ScriptedProvider::new(&[("MSFT", Response::Fail)]);
    let limiter = limiter(100, 1_000);

    let outcome = optimizer(&provider, &limiter).optimize(&OptimizeParams::new(["AAPL", "MSFT", "GOOG"])).await.unwrap();

    assert_eq!(provider.calls(), vec!["AAPL", "MSFT", "GOOG"]);
    assert_eq!(outcome.fallback_tickers, vec!["MSFT"]);
    assert_eq!(outcome.result.allocations.len(), 3);
    assert_eq!(outcome.result.warning.as_deref(), Some("Using synthetic data for: MSFT."));
}

#[tokio::test]
async fn test_empty_series_is_skipped() {
    let provider = ScriptedProvider::new(&[("ZZZZ", Response::Empty)]);
    let limiter = limiter(100, 1_000);

    let outcome = optimizer(&provider, &limiter).optimize(&OptimizeParams::new(["AAPL", "ZZZZ"])).await.unwrap();

    assert_eq!(outcome.skipped_tickers, vec!["ZZZZ"]);
    assert!(outcome.fallback_tickers.is_empty());
    assert_eq!(outcome.result.allocations.len(), 1);
    assert_eq!(outcome.result.allocations[0].allocation_percent, 100.0);
}

#[tokio::test]
async fn test_no_data_at_all_falls_back_for_every_ticker() {
    let provider = ScriptedProvider::new(&[("AAA", Response::Empty), ("BBB", Response::Empty)]);
    let limiter = limiter(100, 1_000);

    let outcome = optimizer(&provider, &limiter).optimize(&OptimizeParams::new(["AAA", "BBB"])).await.unwrap();

    assert_eq!(outcome.fallback_tickers, vec!["AAA", "BBB"]);
    assert!(outcome.skipped_tickers.is_empty());
    assert!(outcome.result.is_fully_allocated());
    assert_eq!(outcome.result.warning.as_deref(), Some("Using synthetic data for: AAA, BBB."));
}

#[tokio::test]
async fn test_quota_exhaustion_stops_fetching() {
    let provider = ScriptedProvider::new(&[]);
    let limiter = limiter(2, 100);

    let outcome = optimizer(&provider, &limiter).optimize(&OptimizeParams::new(["AAA", "BBB", "CCC", "DDD"])).await.unwrap();

    // The clock never moves, so the third request cannot be admitted within the cap
    assert_eq!(provider.calls(), vec!["AAA", "BBB"]);
    assert_eq!(limiter.usage().hourly, 2);
    assert_eq!(outcome.fallback_tickers, vec!["CCC", "DDD"]);
    assert_eq!(outcome.result.allocations.len(), 4);

    let warning = outcome.result.warning.unwrap();
    assert!(warning.starts_with("Hourly rate limit exceeded (2/2) API quota exceeded: waited 0ms"), "{warning}");
    assert!(warning.ends_with("Using synthetic data for: CCC, DDD."), "{warning}");
}

#[tokio::test]
async fn test_threshold_advisory_reported_once() {
    let provider = ScriptedProvider::new(&[]);
    let limiter = limiter(10, 1_000);
    let tickers: Vec<String> = (0..9).map(|i| format!("T{i}")).collect();

    let outcome = optimizer(&provider, &limiter).optimize(&OptimizeParams::new(tickers)).await.unwrap();

    assert_eq!(outcome.result.warning.as_deref(), Some("Approaching hourly rate limit (9/10)"));
    // The advisory check itself consumed nothing
    assert_eq!(limiter.usage().hourly, 9);
}

#[tokio::test]
async fn test_interval_flows_to_provider() {
    let provider = ScriptedProvider::new(&[]);
    let limiter = limiter(100, 1_000);
    let params = OptimizeParams::new(["AAPL", "MSFT"]).with_interval(Interval::Monthly);

    let outcome = optimizer(&provider, &limiter).optimize(&params).await.unwrap();

    assert_eq!(provider.intervals(), vec![Interval::Monthly, Interval::Monthly]);
    assert_eq!(outcome.interval, Interval::Monthly);
}
