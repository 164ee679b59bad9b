use crate::error::Error;
use crate::models::{PathParameters, PricePoint};
use crate::Result;
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Starting value of both the strategy and benchmark series
pub const INITIAL_CAPITAL: f64 = 10_000.0;

/// Fixed daily bias of the comparison index, independent of the strategy drift
pub const BENCHMARK_DRIFT: f64 = 0.0002;

/// Benchmark volatility as a fraction of the strategy volatility
pub const BENCHMARK_VOLATILITY_SCALE: f64 = 0.8;

/// Lowest value a series may reach. Compounding with volatility >= 2 can
/// otherwise produce zero or negative fund values.
pub const VALUE_FLOOR: f64 = 0.01;

/// First calendar day of every generated series
pub fn anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).expect("2023-01-01 is a valid date")
}

/// Source of uniform draws in [0, 1)
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

impl<R: Rng + ?Sized> UniformSource for R {
    fn next_uniform(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Replays a fixed list of draws, cycling when exhausted
#[derive(Debug, Clone)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    /// Panics if `values` is empty
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "SequenceSource needs at least one value");
        Self { values, cursor: 0 }
    }
}

impl UniformSource for SequenceSource {
    fn next_uniform(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

/// Generate a daily strategy/benchmark curve starting at `INITIAL_CAPITAL`.
///
/// Each day draws two uniforms (strategy first, then benchmark) and applies a
/// compounding step. Running values keep full precision; emitted values are
/// rounded to cents. The output has exactly `horizon_days` points dated
/// consecutively from `anchor_date()`.
pub fn generate_path<S>(params: &PathParameters, source: &mut S) -> Result<Vec<PricePoint>>
where
    S: UniformSource + ?Sized,
{
    params.validate()?;

    let anchor = anchor_date();
    let horizon = u64::from(params.horizon_days);
    if anchor.checked_add_days(Days::new(horizon - 1)).is_none() {
        return Err(Error::validation(format!(
            "horizon of {} days runs past the end of the calendar",
            params.horizon_days
        )));
    }

    let benchmark_volatility = params.volatility * BENCHMARK_VOLATILITY_SCALE;
    let mut strategy_value = INITIAL_CAPITAL;
    let mut benchmark_value = INITIAL_CAPITAL;
    let mut points = Vec::with_capacity(params.horizon_days as usize);

    for day in 0..horizon {
        let date = anchor + Days::new(day);

        let strategy_step = (source.next_uniform() - 0.5 + params.drift) * params.volatility;
        let benchmark_step = (source.next_uniform() - 0.5 + BENCHMARK_DRIFT) * benchmark_volatility;

        strategy_value = (strategy_value * (1.0 + strategy_step)).max(VALUE_FLOOR);
        benchmark_value = (benchmark_value * (1.0 + benchmark_step)).max(VALUE_FLOOR);

        points.push(PricePoint {
            date,
            strategy_value: round_cents(strategy_value),
            benchmark_value: round_cents(benchmark_value),
        });
    }

    tracing::debug!(
        horizon_days = params.horizon_days,
        volatility = params.volatility,
        drift = params.drift,
        "Generated synthetic path"
    );

    Ok(points)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Synthetic path generator owning its random source
pub struct SyntheticPathGenerator {
    rng: StdRng,
}

impl SyntheticPathGenerator {
    /// Create a generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a generator seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn generate(&mut self, params: &PathParameters) -> Result<Vec<PricePoint>> {
        generate_path(params, &mut self.rng)
    }
}
