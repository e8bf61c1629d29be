//! # pf_app
//!
//! Portfolio optimization front end: ticker ingestion, configuration, logging,
//! the rate-limited fetch orchestration and report output

pub mod cli;
pub mod config_loader;
pub mod filters;
pub mod optimizer;
pub mod report;
pub mod tickers;
pub mod tracing_setup;

pub use config_loader::AppConfig;
pub use filters::NumericFilter;
pub use optimizer::OptimizationOutcome;
pub use optimizer::OptimizeError;
pub use optimizer::OptimizeParams;
pub use optimizer::Optimizer;
pub use tickers::TickerFileError;
