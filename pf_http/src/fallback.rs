//! Deterministic stand-in price history
//!
//! Used when no API key is configured and by the optimizer whenever a ticker's
//! real history could not be fetched. The series is a random walk seeded from the
//! ticker, so the same ticker always produces the same bars.

use pf_types::DataSource;
use pf_types::Interval;
use pf_types::PriceBar;
use pf_types::Series;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use time::macros::datetime;
use time::OffsetDateTime;

/// Number of bars in every synthetic series
pub const SYNTHETIC_BARS: usize = 30;

const SYNTHETIC_START: OffsetDateTime = datetime!(2024-01-02 00:00 UTC);

/// Maximum absolute per-period move of the random walk
const MAX_MOVE: f64 = 0.02;

/// FNV-1a over the ticker bytes
fn seed_for(ticker: &str) -> u64 {
    ticker.bytes().fold(0xCBF2_9CE4_8422_2325, |hash, byte| (hash ^ byte as u64).wrapping_mul(0x0100_0000_01B3))
}

fn step_days(interval: Interval) -> i64 {
    match interval {
        Interval::Daily => 1,
        Interval::Weekly => 7,
        Interval::Monthly => 30,
    }
}

#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Synthetic history for `ticker`, marked `DataSource::Synthetic`
pub fn synthetic_series(ticker: &str, interval: Interval) -> Series {
    let mut rng = StdRng::seed_from_u64(seed_for(ticker));
    let step = step_days(interval);
    let mut price: f64 = rng.gen_range(20.0..200.0);

    let bars = (0..SYNTHETIC_BARS as i64)
        .map(|i| {
            let open = price;
            let close = (open * (1.0 + rng.gen_range(-MAX_MOVE..MAX_MOVE))).max(0.01);
            let spread: f64 = rng.gen_range(0.0..0.01);
            price = close;

            PriceBar {
                date: SYNTHETIC_START + time::Duration::days(step * i),
                open: round2(open),
                high: round2(open.max(close) * (1.0 + spread)),
                low: round2(open.min(close) * (1.0 - spread)),
                close: round2(close),
                adj_close: round2(close),
                volume: rng.gen_range(500_000..2_000_000),
            }
        })
        .collect();

    Series::new(ticker, interval, DataSource::Synthetic, bars)
}
