//! Pre-configured quota limiters for market data providers
//!
//! Each preset mirrors the published request allowance of a provider plan so a
//! limiter can be built without hand-copying numbers from its pricing page.
//!
//! # Presets
//!
//! - **market_data**: end-of-day price history REST plans

pub mod market_data;
