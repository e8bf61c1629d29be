//! # pf_types
//!
//! Domain types shared by the fetch, orchestration and report layers

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

/// Allowed deviation of summed allocation percentages from 100
pub const ALLOCATION_TOLERANCE: f64 = 0.01;

/// Sampling interval of a price series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    /// Provider resampling keyword
    pub const fn as_str(self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        }
    }

    /// Observations per year, used to annualise returns
    pub const fn periods_per_year(self) -> f64 {
        match self {
            Interval::Daily => 252.0,
            Interval::Weekly => 52.0,
            Interval::Monthly => 12.0,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "1d" | "d" => Ok(Interval::Daily),
            "weekly" | "1wk" | "w" => Ok(Interval::Weekly),
            "monthly" | "1mo" | "m" => Ok(Interval::Monthly),
            other => Err(ParseLabelError { kind: "interval", value: other.to_string() }),
        }
    }
}

/// Optimization method label chosen by the user
///
/// The label only names the report; it does not change how data is fetched or
/// how allocations are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationMethod {
    #[default]
    MeanVariance,
    MinimumVariance,
    MaximumSharpe,
    RiskParity,
    BlackLitterman,
    MonteCarlo,
    EqualWeight,
}

impl OptimizationMethod {
    pub const ALL: [OptimizationMethod; 7] = [
        OptimizationMethod::MeanVariance,
        OptimizationMethod::MinimumVariance,
        OptimizationMethod::MaximumSharpe,
        OptimizationMethod::RiskParity,
        OptimizationMethod::BlackLitterman,
        OptimizationMethod::MonteCarlo,
        OptimizationMethod::EqualWeight,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            OptimizationMethod::MeanVariance => "mean-variance",
            OptimizationMethod::MinimumVariance => "minimum-variance",
            OptimizationMethod::MaximumSharpe => "maximum-sharpe",
            OptimizationMethod::RiskParity => "risk-parity",
            OptimizationMethod::BlackLitterman => "black-litterman",
            OptimizationMethod::MonteCarlo => "monte-carlo",
            OptimizationMethod::EqualWeight => "equal-weight",
        }
    }

    /// Human readable name for reports
    pub const fn display_name(self) -> &'static str {
        match self {
            OptimizationMethod::MeanVariance => "Mean-Variance Optimization",
            OptimizationMethod::MinimumVariance => "Minimum Variance",
            OptimizationMethod::MaximumSharpe => "Maximum Sharpe Ratio",
            OptimizationMethod::RiskParity => "Risk Parity",
            OptimizationMethod::BlackLitterman => "Black-Litterman",
            OptimizationMethod::MonteCarlo => "Monte Carlo Simulation",
            OptimizationMethod::EqualWeight => "Equal Weight",
        }
    }
}

impl fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptimizationMethod {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        OptimizationMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == normalized)
            .ok_or(ParseLabelError { kind: "optimization method", value: s.trim().to_string() })
    }
}

/// Unrecognised interval or method label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseLabelError {}

/// One period of price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Where a series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Returned by the market data provider
    Provider,
    /// Generated locally because provider data was unavailable
    Synthetic,
}

/// Ordered price history of one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub ticker: String,
    pub interval: Interval,
    pub source: DataSource,
    pub bars: Vec<PriceBar>,
}

impl Series {
    pub fn new(ticker: impl Into<String>, interval: Interval, source: DataSource, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        Self { ticker: ticker.into(), interval, source, bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.adj_close)
    }

    /// Simple period-over-period returns of the adjusted close
    ///
    /// Pairs with a non-positive starting price are skipped.
    pub fn returns(&self) -> Vec<f64> {
        self.bars
            .windows(2)
            .filter(|pair| pair[0].adj_close > 0.0)
            .map(|pair| (pair[1].adj_close - pair[0].adj_close) / pair[0].adj_close)
            .collect()
    }
}

/// Share of the portfolio assigned to one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub asset: String,
    pub allocation_percent: f64,
}

/// Summary statistics of a portfolio, in percent where applicable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub expected_return: f64,
    pub risk: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
}

/// Point on a risk/return curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub risk: f64,
    #[serde(rename = "return")]
    pub expected_return: f64,
}

/// Result handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub allocations: Vec<Allocation>,
    pub metrics: PortfolioMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficient_frontier: Option<Vec<FrontierPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl OptimizationResult {
    /// Sum of all allocation percentages
    pub fn allocation_total(&self) -> f64 {
        self.allocations.iter().map(|a| a.allocation_percent).sum()
    }

    /// True when allocations add up to 100 within `ALLOCATION_TOLERANCE`
    pub fn is_fully_allocated(&self) -> bool {
        (self.allocation_total() - 100.0).abs() <= ALLOCATION_TOLERANCE
    }
}
