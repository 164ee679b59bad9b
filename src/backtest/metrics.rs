use super::synthetic::INITIAL_CAPITAL;
use crate::models::{PricePoint, SimulationMetrics};
use serde::{Deserialize, Serialize};

/// Calendar days per year, used for annualisation
const DAYS_PER_YEAR: f64 = 365.0;

/// Summary statistics derived from a synthetic path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathMetrics {
    /// Fractional return of the strategy (0.154 = +15.4%)
    pub total_return: f64,
    pub annualized_return: f64,
    /// Worst peak-to-trough decline, always <= 0
    pub max_drawdown: f64,
    /// Mean daily return over its standard deviation, annualised
    pub return_ratio: f64,
    pub benchmark_return: f64,
    pub final_value: f64,
    pub horizon_days: usize,
}

impl PathMetrics {
    /// Calculate metrics from a generated path
    pub fn from_points(points: &[PricePoint]) -> Self {
        let Some(last) = points.last() else {
            return Self::empty();
        };

        let strategy: Vec<f64> = points.iter().map(|p| p.strategy_value).collect();
        let strategy_return = total_return(last.strategy_value);
        let horizon_days = points.len();

        Self {
            total_return: strategy_return,
            annualized_return: annualized_return(strategy_return, horizon_days),
            max_drawdown: max_drawdown(&strategy),
            return_ratio: return_ratio(&strategy),
            benchmark_return: total_return(last.benchmark_value),
            final_value: last.strategy_value,
            horizon_days,
        }
    }

    fn empty() -> Self {
        Self {
            total_return: 0.0,
            annualized_return: 0.0,
            max_drawdown: 0.0,
            return_ratio: 0.0,
            benchmark_return: 0.0,
            final_value: INITIAL_CAPITAL,
            horizon_days: 0,
        }
    }

    /// Strategy return minus benchmark return
    pub fn excess_return(&self) -> f64 {
        self.total_return - self.benchmark_return
    }

    /// Format as the display strings used for commentary and reports
    pub fn to_display(&self) -> SimulationMetrics {
        SimulationMetrics {
            total_return: format_percent(self.total_return),
            annualized_return: format_percent(self.annualized_return),
            max_drawdown: format_percent(self.max_drawdown),
            sharpe_ratio: format!("{:.2}", self.return_ratio),
        }
    }

    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n📊 PERFORMANCE");
        println!("  Horizon:               {} days", self.horizon_days);
        println!("  Final Value:           ${:.2}", self.final_value);
        println!("  Total Return:          {}", format_percent(self.total_return));
        println!("  Annualized Return:     {}", format_percent(self.annualized_return));
        println!("  Benchmark Return:      {}", format_percent(self.benchmark_return));
        println!("  Excess Return:         {}", format_percent(self.excess_return()));

        println!("\n⚠️  RISK METRICS");
        println!("  Max Drawdown:          {}", format_percent(self.max_drawdown));
        println!("  Return Ratio:          {:.2}", self.return_ratio);
    }
}

/// `(last / INITIAL_CAPITAL) - 1`
pub fn total_return(final_value: f64) -> f64 {
    final_value / INITIAL_CAPITAL - 1.0
}

/// Compound `total_return` over `horizon_days` into a yearly rate
pub fn annualized_return(total_return: f64, horizon_days: usize) -> f64 {
    if horizon_days == 0 {
        return 0.0;
    }
    (1.0 + total_return).powf(DAYS_PER_YEAR / horizon_days as f64) - 1.0
}

/// Largest decline from a running peak, as a non-positive fraction
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &value in values {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            max_dd = max_dd.min(value / peak - 1.0);
        }
    }

    max_dd
}

/// Annualised mean/stdev ratio of daily simple returns.
///
/// The first return is measured from `INITIAL_CAPITAL`. Risk-free rate is 0.
pub fn return_ratio(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut previous = INITIAL_CAPITAL;
    let returns: Vec<f64> = values
        .iter()
        .map(|&value| {
            let r = value / previous - 1.0;
            previous = value;
            r
        })
        .collect();

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns
        .iter()
        .map(|r| {
            let diff = r - mean;
            diff * diff
        })
        .sum::<f64>()
        / returns.len() as f64;

    let std_dev = variance.sqrt();
    if std_dev > 0.0 {
        mean / std_dev * DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// `0.154` -> `+15.40%`
pub fn format_percent(fraction: f64) -> String {
    format!("{:+.2}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn points_from(values: &[f64]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| PricePoint {
                date: start + Days::new(i as u64),
                strategy_value: v,
                benchmark_value: 10_000.0,
            })
            .collect()
    }

    #[test]
    fn test_total_return() {
        let metrics = PathMetrics::from_points(&points_from(&[10_100.0, 11_540.0]));
        assert!((metrics.total_return - 0.154).abs() < 1e-9);
        assert_eq!(metrics.benchmark_return, 0.0);
        assert!((metrics.excess_return() - 0.154).abs() < 1e-9);
    }

    #[test]
    fn test_annualized_return_full_year_matches_total() {
        assert!((annualized_return(0.10, 365) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_annualized_return_two_years() {
        // 10% over two years is sqrt(1.1) - 1 per year
        let annual = annualized_return(0.10, 730);
        assert!((annual - (1.1_f64.sqrt() - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_drawdown_calculation() {
        // Peak 11000, trough 9900 => -10%
        let dd = max_drawdown(&[10_000.0, 11_000.0, 9_900.0, 10_500.0]);
        assert!((dd - (-0.10)).abs() < 1e-9);
    }

    #[test]
    fn test_drawdown_zero_when_non_decreasing() {
        assert_eq!(max_drawdown(&[10_000.0, 10_000.0, 10_050.0, 10_200.0]), 0.0);
    }

    #[test]
    fn test_drawdown_negative_on_any_decline() {
        assert!(max_drawdown(&[10_000.0, 9_999.99]) < 0.0);
    }

    #[test]
    fn test_return_ratio_flat_series_is_zero() {
        assert_eq!(return_ratio(&[10_000.0; 30]), 0.0);
    }

    #[test]
    fn test_return_ratio_sign_follows_trend() {
        let rising: Vec<f64> = (1..=60)
            .map(|i| 10_000.0 + i as f64 * 10.0 + if i % 2 == 0 { 5.0 } else { 0.0 })
            .collect();
        let falling: Vec<f64> = (1..=60)
            .map(|i| 10_000.0 - i as f64 * 10.0 + if i % 2 == 0 { 5.0 } else { 0.0 })
            .collect();

        assert!(return_ratio(&rising) > 0.0);
        assert!(return_ratio(&falling) < 0.0);
    }

    #[test]
    fn test_empty_path() {
        let metrics = PathMetrics::from_points(&[]);
        assert_eq!(metrics.horizon_days, 0);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn test_display_formatting() {
        let metrics = PathMetrics::from_points(&points_from(&[11_000.0, 9_900.0, 11_540.0]));
        let display = metrics.to_display();

        assert_eq!(display.total_return, "+15.40%");
        assert_eq!(display.max_drawdown, "-10.00%");
        assert_eq!(format_percent(-0.082), "-8.20%");
    }
}
