use super::metrics::PathMetrics;
use super::synthetic::{generate_path, UniformSource};
use crate::advisor::{AdvisorBackend, CommentaryRequest};
use crate::error::Error;
use crate::models::{PathParameters, PricePoint, SimulationCommentary, StrategyType};
use crate::Result;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// One completed simulator run: the curve, local metrics and AI commentary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub id: Uuid,
    pub strategy: StrategyType,
    pub params: PathParameters,
    pub initial_capital: f64,
    pub points: Vec<PricePoint>,
    pub metrics: PathMetrics,
    pub commentary: SimulationCommentary,
}

impl RunResult {
    /// Print a formatted report to stdout
    pub fn print_report(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║              SIMULATED BACKTEST REPORT                ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");

        println!("  Strategy:              {}", self.strategy);
        println!("  Run:                   {}", self.id);
        println!(
            "  Parameters:            {} days, volatility {:.4}, drift {:.4}",
            self.params.horizon_days, self.params.volatility, self.params.drift
        );

        self.metrics.print_report();

        println!("\n📈 CURVE (strategy vs benchmark)");
        let step = (self.points.len() / 12).max(1);
        for point in self.points.iter().step_by(step) {
            println!(
                "  {}   {:>12.2}   {:>12.2}",
                point.date, point.strategy_value, point.benchmark_value
            );
        }
        if let Some(last) = self.points.last() {
            if (self.points.len() - 1) % step != 0 {
                println!(
                    "  {}   {:>12.2}   {:>12.2}",
                    last.date, last.strategy_value, last.benchmark_value
                );
            }
        }

        println!("\n🤖 AI ANALYSIS");
        println!("  {}", self.commentary.analysis);
        println!(
            "  Forward estimate: return {}, annualized {}, drawdown {}, Sharpe {}",
            self.commentary.metrics.total_return,
            self.commentary.metrics.annualized_return,
            self.commentary.metrics.max_drawdown,
            self.commentary.metrics.sharpe_ratio
        );

        println!("\n═══════════════════════════════════════════════════════\n");
    }
}

/// Runs strategy simulations: synthetic curve, metrics, then AI commentary
pub struct SimulationRunner {
    backend: Arc<dyn AdvisorBackend>,
    volatility: f64,
}

impl SimulationRunner {
    pub fn new(backend: Arc<dyn AdvisorBackend>, volatility: f64) -> Self {
        Self {
            backend,
            volatility,
        }
    }

    /// Build the path parameters for a strategy preset
    pub fn parameters_for(&self, strategy: StrategyType, horizon_days: u32) -> PathParameters {
        PathParameters::new(horizon_days, self.volatility, strategy.drift())
    }

    /// Run one simulation.
    ///
    /// Invalid parameters fail before anything is generated. A failed
    /// commentary request does not fail the run; the result carries
    /// placeholder commentary instead.
    pub async fn run<S>(
        &self,
        strategy: StrategyType,
        horizon_days: u32,
        initial_capital: f64,
        source: &mut S,
    ) -> Result<RunResult>
    where
        S: UniformSource + ?Sized,
    {
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(Error::validation(format!(
                "initial capital must be positive, got {}",
                initial_capital
            )));
        }

        let params = self.parameters_for(strategy, horizon_days);
        let points = generate_path(&params, source)?;
        let metrics = PathMetrics::from_points(&points);

        tracing::info!(
            strategy = %strategy,
            horizon_days,
            total_return = metrics.total_return,
            max_drawdown = metrics.max_drawdown,
            "Simulation generated"
        );

        let commentary = self
            .commentary(strategy, horizon_days, initial_capital, &metrics)
            .await;

        Ok(RunResult {
            id: Uuid::new_v4(),
            strategy,
            params,
            initial_capital,
            points,
            metrics,
            commentary,
        })
    }

    async fn commentary(
        &self,
        strategy: StrategyType,
        horizon_days: u32,
        initial_capital: f64,
        metrics: &PathMetrics,
    ) -> SimulationCommentary {
        let request = CommentaryRequest {
            strategy_label: strategy.label().to_string(),
            params: json!({
                "initialCapital": initial_capital,
                "duration": horizon_days,
                "observed": metrics.to_display(),
            }),
        };

        match self.backend.simulation_commentary(&request).await {
            Ok(commentary) => commentary,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "Simulation commentary failed, using placeholder"
                );
                SimulationCommentary::unavailable()
            }
        }
    }
}
