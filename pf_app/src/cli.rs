use std::path::PathBuf;

use clap::Parser;
use pf_types::Interval;
use pf_types::OptimizationMethod;
use tracing::warn;

use crate::filters::NumericFilter;
use crate::tickers;
use crate::tickers::DEFAULT_TICKER_COLUMN;
use crate::tickers::TickerFileError;

/// Command-line arguments of `pf_optimize`
#[derive(Parser, Debug, Clone)]
#[command(name = "pf_optimize")]
#[command(about = "Fetch price history under an API quota and build a portfolio report")]
pub struct Args {
    /// CSV or TXT file with one row per ticker
    #[arg(short = 'f', long)]
    pub tickers_file: Option<PathBuf>,

    /// Column of the tickers file holding the symbols
    #[arg(long, default_value = DEFAULT_TICKER_COLUMN)]
    pub column: String,

    /// Keep only rows passing a numeric filter, e.g. `Price>=10` (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<NumericFilter>,

    /// Ticker to include in addition to the file (repeatable)
    #[arg(short = 't', long = "ticker")]
    pub tickers: Vec<String>,

    /// Sampling interval: daily, weekly or monthly
    #[arg(short, long, default_value = "daily")]
    pub interval: Interval,

    /// Optimization method label
    #[arg(short, long, default_value = "mean-variance")]
    pub method: OptimizationMethod,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Args {
    /// Tickers from the file (filtered) followed by `--ticker` values
    pub fn collect_tickers(&self) -> Result<Vec<String>, TickerFileError> {
        let mut collected = Vec::new();

        match &self.tickers_file {
            Some(path) => {
                tickers::validate_upload(&path.to_string_lossy())?;
                collected = tickers::unique_tickers_filtered(path, &self.column, &self.filters)?;
            }
            None if !self.filters.is_empty() => warn!("--filter has no effect without --tickers-file"),
            None => {}
        }

        collected.extend(self.tickers.iter().cloned());
        Ok(collected)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["pf_optimize", "-t", "AAPL"]).unwrap();

        assert_eq!(args.column, "Ticker");
        assert_eq!(args.interval, Interval::Daily);
        assert_eq!(args.method, OptimizationMethod::MeanVariance);
        assert_eq!(args.tickers, vec!["AAPL"]);
        assert!(args.filters.is_empty());
    }

    #[test]
    fn test_parses_typed_values() {
        let args = Args::try_parse_from([
            "pf_optimize",
            "--ticker",
            "aapl",
            "--ticker",
            "msft",
            "--interval",
            "weekly",
            "--method",
            "risk_parity",
            "--filter",
            "Price>=10",
            "--filter",
            "Price<500",
        ])
        .unwrap();

        assert_eq!(args.tickers, vec!["aapl", "msft"]);
        assert_eq!(args.interval, Interval::Weekly);
        assert_eq!(args.method, OptimizationMethod::RiskParity);
        assert_eq!(args.filters.len(), 2);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Args::try_parse_from(["pf_optimize", "--interval", "hourly"]).is_err());
        assert!(Args::try_parse_from(["pf_optimize", "--filter", "Price=10"]).is_err());
    }

    #[test]
    fn test_collect_from_file_and_flags() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"Ticker,Price\nAAPL,150\nGOOG,2700\nMSFT,250\n").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let args = Args::try_parse_from(["pf_optimize", "-f", path.as_str(), "--filter", "Price<1000", "-t", "SPY"]).unwrap();

        assert_eq!(args.collect_tickers().unwrap(), vec!["AAPL", "MSFT", "SPY"]);
    }

    #[test]
    fn test_collect_rejects_unsupported_file() {
        let args = Args::try_parse_from(["pf_optimize", "-f", "tickers.xlsx"]).unwrap();
        assert!(matches!(args.collect_tickers(), Err(TickerFileError::UnsupportedFileType(_))));
    }
}
