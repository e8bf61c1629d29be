use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use pf_types::Interval;
use pf_types::Series;

use crate::errors::Result;

/// Source of historical price series
///
/// Implementations perform one upstream request per call and never rate limit
/// themselves; callers gate them with a shared limiter. An empty series means the
/// provider knows nothing about the ticker.
pub trait HistoryProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Fetch the price history of `ticker` sampled at `interval`
    fn fetch_series(&self, ticker: String, interval: Interval) -> Pin<Box<dyn Future<Output = Result<Series>> + Send + '_>>;
}

impl<P: HistoryProvider + ?Sized> HistoryProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_series(&self, ticker: String, interval: Interval) -> Pin<Box<dyn Future<Output = Result<Series>> + Send + '_>> {
        (**self).fetch_series(ticker, interval)
    }
}
