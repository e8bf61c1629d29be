use std::fs;
use std::io;
use std::path::Path;

use pf_ratelimit::QuotaUsage;
use thiserror::Error;

use crate::optimizer::OptimizationOutcome;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to serialise report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Pretty JSON of the outcome
pub fn to_json(outcome: &OptimizationOutcome) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

/// Write the outcome as pretty JSON, creating parent directories as needed
pub fn write_json<P: AsRef<Path>>(path: P, outcome: &OptimizationOutcome) -> Result<(), ReportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, to_json(outcome)?)?;
    Ok(())
}

/// Human readable summary, one line per entry
pub fn summary_lines(outcome: &OptimizationOutcome) -> Vec<String> {
    let result = &outcome.result;
    let metrics = &result.metrics;

    let mut lines = vec![
        "═══════════════════════════════════════════════════════".to_string(),
        format!("{} ({} data)", outcome.method.display_name(), outcome.interval),
        "═══════════════════════════════════════════════════════".to_string(),
    ];

    for allocation in &result.allocations {
        let marker = if outcome.fallback_tickers.contains(&allocation.asset) { " *" } else { "" };
        lines.push(format!("  {:<10} {:>7.2}%{}", allocation.asset, allocation.allocation_percent, marker));
    }

    lines.push(format!("Expected return: {:.2}%", metrics.expected_return));
    lines.push(format!("Risk:            {:.2}%", metrics.risk));
    lines.push(match metrics.sharpe_ratio {
        Some(sharpe) => format!("Sharpe ratio:    {sharpe:.2}"),
        None => "Sharpe ratio:    n/a".to_string(),
    });

    if !outcome.fallback_tickers.is_empty() {
        lines.push("  * synthetic data".to_string());
    }
    if !outcome.skipped_tickers.is_empty() {
        lines.push(format!("No data: {}", outcome.skipped_tickers.join(", ")));
    }
    if let Some(warning) = &result.warning {
        lines.push(format!("Warning: {warning}"));
    }

    lines
}

/// One-line quota summary
pub fn usage_line(usage: &QuotaUsage) -> String {
    format!(
        "Quota used: {}/{} this hour ({} left), {}/{} today ({} left)",
        usage.hourly,
        usage.hourly_limit,
        usage.hourly_remaining(),
        usage.daily,
        usage.daily_limit,
        usage.daily_remaining()
    )
}
