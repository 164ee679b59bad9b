use crate::backtest::synthetic::UniformSource;
use crate::models::FundQuote;

/// Maximum absolute tick, in percentage points
pub const MAX_TICK_PERCENT: f64 = 0.05;

#[allow(clippy::too_many_arguments)]
fn quote(
    id: &str,
    name: &str,
    code: &str,
    price: f64,
    change_percent: f64,
    volume_label: &str,
    sector: &str,
    trend_7d: &[f64],
) -> FundQuote {
    FundQuote {
        id: id.to_string(),
        name: name.to_string(),
        code: code.to_string(),
        price,
        change_percent,
        volume_label: volume_label.to_string(),
        trend_7d: trend_7d.to_vec(),
        sector: sector.to_string(),
    }
}

/// The six funds tracked by a fresh monitor session
pub fn default_watchlist() -> Vec<FundQuote> {
    vec![
        quote(
            "1",
            "China Merchants CSI Liquor",
            "161725",
            1.245,
            1.2,
            "Expanding",
            "Consumer",
            &[1.1, 1.12, 1.15, 1.14, 1.18, 1.20, 1.24],
        ),
        quote(
            "2",
            "Lion Growth Mixed",
            "320007",
            2.103,
            -0.8,
            "Shrinking",
            "Semiconductors",
            &[2.2, 2.18, 2.15, 2.16, 2.14, 2.12, 2.10],
        ),
        quote(
            "3",
            "E Fund Blue Chip",
            "005827",
            1.890,
            0.3,
            "Normal",
            "Mixed",
            &[1.85, 1.86, 1.88, 1.88, 1.87, 1.89, 1.89],
        ),
        quote(
            "4",
            "New Energy ETF",
            "516160",
            0.985,
            2.5,
            "Surging",
            "New Energy",
            &[0.92, 0.93, 0.95, 0.94, 0.96, 0.97, 0.98],
        ),
        quote(
            "5",
            "Healthcare ETF",
            "512170",
            0.450,
            -1.5,
            "Drifting Lower",
            "Healthcare",
            &[0.48, 0.47, 0.47, 0.46, 0.46, 0.45, 0.45],
        ),
        quote(
            "6",
            "China Internet ETF",
            "513050",
            1.050,
            0.1,
            "Consolidating",
            "Technology",
            &[1.02, 1.03, 1.04, 1.04, 1.05, 1.04, 1.05],
        ),
    ]
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Map a uniform draw in [0, 1) to a tick in [-0.05, +0.05] percentage points
pub fn draw_tick<S: UniformSource + ?Sized>(source: &mut S) -> f64 {
    (source.next_uniform() - 0.5) * (MAX_TICK_PERCENT * 2.0)
}

/// Apply one tick to a quote.
///
/// The change moves by `tick` percentage points and the price by the same
/// fraction. The 7-day trend is left as is.
pub fn apply_tick(quote: &mut FundQuote, tick: f64) {
    quote.change_percent = round_to(quote.change_percent + tick, 2);
    quote.price = round_to(quote.price * (1.0 + tick / 100.0), 3);
}

/// Apply an independent tick to every quote
pub fn tick_all<S: UniformSource + ?Sized>(quotes: &mut [FundQuote], source: &mut S) {
    for quote in quotes.iter_mut() {
        let tick = draw_tick(source);
        apply_tick(quote, tick);
    }
}
