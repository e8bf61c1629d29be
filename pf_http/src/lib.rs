//! # pf_http
//!
//! Historical price retrieval for the portfolio optimizer: a pooled HTTP client,
//! the `HistoryProvider` seam, an end-of-day REST provider and the synthetic
//! series used when real data is unavailable.

pub mod client;
pub mod errors;
pub mod fallback;
pub mod provider;
pub mod tiingo;

pub use client::HttpClient;
pub use client::HttpClientConfig;
pub use errors::FetchError;
pub use errors::Result;
pub use fallback::synthetic_series;
pub use provider::HistoryProvider;
pub use tiingo::TiingoClient;
pub use tiingo::TiingoClientBuilder;
