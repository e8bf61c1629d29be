use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pf_app::AppConfig;
use pf_app::OptimizeParams;
use pf_app::Optimizer;
use pf_app::cli::Args;
use pf_app::config_loader;
use pf_app::report;
use pf_app::tracing_setup;
use pf_ratelimit::QuotaLimiter;
use pf_ratelimit::RateLimiter;
use tracing::info;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API keys may live in a local .env
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let loaded = config_loader::load_config(args.config.as_deref());
    let config = loaded.as_ref().cloned().unwrap_or_else(|_| AppConfig::default());
    let _guard = tracing_setup::init("pf_optimize", &config.logging);

    if let Err(err) = &loaded {
        warn!("Failed to load config: {}. Using defaults.", err);
    }

    info!("=== Portfolio Optimizer ===");

    let tickers = args.collect_tickers().context("failed to read tickers")?;

    let limiter = Arc::new(QuotaLimiter::new(config.rate_limit.limiter_config().context("invalid rate limit configuration")?));
    let provider = Arc::new(config.provider.client_builder().build().context("failed to build provider client")?);

    info!("Configuration:");
    info!("  Tickers: {}", tickers.len());
    info!("  Interval: {}", args.interval);
    info!("  Method: {}", args.method.display_name());
    info!("  Quota: {}/hour, {}/day", config.rate_limit.requests_per_hour, config.rate_limit.requests_per_day);
    if !provider.has_credentials() {
        warn!("{} is not set, prices will be synthetic", config.provider.api_key_env);
    }

    let optimizer = Optimizer::new(provider, limiter.clone())
        .with_policy(config.rate_limit.retry_policy())
        .with_risk_free_rate(config.risk_free_rate);

    let params = OptimizeParams::new(tickers).with_interval(args.interval).with_method(args.method);
    let outcome = optimizer.optimize(&params).await?;

    for line in report::summary_lines(&outcome) {
        info!("{}", line);
    }
    info!("{}", report::usage_line(&limiter.usage()));

    match &args.output {
        Some(path) => {
            report::write_json(path, &outcome).with_context(|| format!("failed to write {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", report::to_json(&outcome)?),
    }

    Ok(())
}
