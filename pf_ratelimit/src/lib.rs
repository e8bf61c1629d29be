pub mod error;
pub mod limiter;
pub mod providers;
pub mod quota;
pub mod time;
pub mod window;
pub mod wrap;

pub use error::RateLimitError;
pub use error::Result;
pub use limiter::PermissionResult;
pub use limiter::QuotaUsage;
pub use limiter::RateLimiter;
pub use quota::QuotaLimiter;
pub use quota::RateLimiterConfig;
pub use quota::RateLimiterConfigBuilder;
pub use time::Clock;
pub use time::ManualClock;
pub use time::SystemClock;
pub use time::TokioClock;
pub use wrap::RateLimited;
pub use wrap::RetryPolicy;
pub use wrap::wrap_async;
