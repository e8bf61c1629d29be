use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::RateLimitError;
use crate::limiter::RateLimiter;

/// How long a rate-limited call is willing to wait for admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Sleep used when a denial carries no usable delay
    pub fallback_delay: Duration,

    /// Upper bound on total sleeping per call; `None` waits indefinitely
    pub max_wait: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { fallback_delay: Duration::from_millis(1_000), max_wait: Some(Duration::from_secs(300)) }
    }
}

impl RetryPolicy {
    /// Retry until admitted, however long that takes
    pub fn unbounded() -> Self {
        Self { max_wait: None, ..Self::default() }
    }

    /// Give up once total waiting would exceed `max_wait`
    pub fn with_max_wait(max_wait: Duration) -> Self {
        Self { max_wait: Some(max_wait), ..Self::default() }
    }
}

/// An async operation gated by a shared rate limiter
///
/// `call` has the wrapped function's signature: it waits for admission, then
/// invokes the function with the original argument and returns its result
/// untouched. Admission failures surface through the caller's error type.
pub struct RateLimited<L: ?Sized, F> {
    limiter: Arc<L>,
    policy: RetryPolicy,
    inner: F,
}

impl<L: RateLimiter + ?Sized, F> RateLimited<L, F> {
    pub fn new(limiter: Arc<L>, inner: F) -> Self {
        Self { limiter, policy: RetryPolicy::default(), inner }
    }

    /// Replace the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn limiter(&self) -> &Arc<L> {
        &self.limiter
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Wait for admission, then run the wrapped operation
    pub async fn call<A, Fut, T, E>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RateLimitError>,
    {
        self.limiter.acquire(&self.policy).await?;
        (self.inner)(args).await
    }
}

/// Gate `f` behind `limiter` with the default retry policy
pub fn wrap_async<L, F>(limiter: Arc<L>, f: F) -> RateLimited<L, F>
where
    L: RateLimiter + ?Sized,
{
    RateLimited::new(limiter, f)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::QuotaLimiter;
    use crate::RateLimiterConfig;
    use crate::time::HOUR_MS;
    use crate::time::TokioClock;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Limited(RateLimitError),
        Upstream(&'static str),
    }

    impl From<RateLimitError> for TestError {
        fn from(err: RateLimitError) -> Self {
            TestError::Limited(err)
        }
    }

    fn two_per_hour() -> Arc<QuotaLimiter<TokioClock>> {
        let config = RateLimiterConfig::new(2, 100).unwrap();
        Arc::new(QuotaLimiter::with_clock(config, TokioClock::new()))
    }

    #[test]
    fn test_default_policy_is_bounded() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.fallback_delay, Duration::from_millis(1_000));
        assert_eq!(policy.max_wait, Some(Duration::from_secs(300)));
        assert_eq!(RetryPolicy::unbounded().max_wait, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_arguments_and_results_through() {
        let wrapped = wrap_async(two_per_hour(), |x: u32| async move { Ok::<_, TestError>(x * 2) });

        assert_eq!(wrapped.call(21).await, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_propagates_inner_failure() {
        let wrapped = wrap_async(two_per_hour(), |_: ()| async { Err::<u32, _>(TestError::Upstream("provider down")) });

        assert_eq!(wrapped.call(()).await, Err(TestError::Upstream("provider down")));
        // The failed call still consumed quota
        assert_eq!(wrapped.limiter().usage().hourly, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_waits_for_window_to_free() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let wrapped = wrap_async(two_per_hour(), move |ticker: &'static str| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(ticker.len())
            }
        })
        .with_policy(RetryPolicy::unbounded());

        let start = tokio::time::Instant::now();
        for ticker in ["AAPL", "MSFT", "GOOG"] {
            assert_eq!(wrapped.call(ticker).await, Ok(4));
        }

        assert_eq!(invocations.load(Ordering::SeqCst), 3);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(HOUR_MS), "waited {waited:?}");
        assert!(waited < Duration::from_millis(HOUR_MS + 1_000), "waited {waited:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_wait_surfaces_quota_exceeded() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&invocations);
        let wrapped = wrap_async(two_per_hour(), move |_: ()| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(())
            }
        })
        .with_policy(RetryPolicy::with_max_wait(Duration::from_secs(60)));

        assert!(wrapped.call(()).await.is_ok());
        assert!(wrapped.call(()).await.is_ok());

        let start = tokio::time::Instant::now();
        let result = wrapped.call(()).await;

        assert!(matches!(result, Err(TestError::Limited(RateLimitError::QuotaExceeded { waited, .. })) if waited.is_zero()));
        assert_eq!(invocations.load(Ordering::SeqCst), 2);
        // Gave up without sleeping since the first delay already exceeded the cap
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrappers_share_one_budget() {
        let limiter = two_per_hour();
        let prices = wrap_async(Arc::clone(&limiter), |_: ()| async { Ok::<_, TestError>("prices") })
            .with_policy(RetryPolicy::with_max_wait(Duration::from_secs(1)));
        let volumes = wrap_async(Arc::clone(&limiter), |_: ()| async { Ok::<_, TestError>("volumes") })
            .with_policy(RetryPolicy::with_max_wait(Duration::from_secs(1)));

        assert!(prices.call(()).await.is_ok());
        assert!(volumes.call(()).await.is_ok());
        assert!(matches!(prices.call(()).await, Err(TestError::Limited(_))));
        assert!(matches!(volumes.call(()).await, Err(TestError::Limited(_))));
    }
}
