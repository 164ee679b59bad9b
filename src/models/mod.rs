use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// One simulated day of a synthetic backtest curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub strategy_value: f64,
    pub benchmark_value: f64,
}

/// Tuning for a single synthetic path run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathParameters {
    pub horizon_days: u32,
    /// Scale of the per-step random term (0.015 = 1.5%)
    pub volatility: f64,
    /// Mean per-step bias added to the random term
    pub drift: f64,
}

impl PathParameters {
    pub fn new(horizon_days: u32, volatility: f64, drift: f64) -> Self {
        Self {
            horizon_days,
            volatility,
            drift,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.horizon_days == 0 {
            return Err(Error::validation("horizon_days must be positive"));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(Error::validation(format!(
                "volatility must be a non-negative number, got {}",
                self.volatility
            )));
        }
        if !self.drift.is_finite() {
            return Err(Error::validation(format!(
                "drift must be finite, got {}",
                self.drift
            )));
        }
        Ok(())
    }
}

/// Strategy families offered by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyType {
    MaCrossover,
    RsiMeanReversion,
    Momentum,
    GridTrading,
}

impl StrategyType {
    pub const ALL: [StrategyType; 4] = [
        StrategyType::MaCrossover,
        StrategyType::RsiMeanReversion,
        StrategyType::Momentum,
        StrategyType::GridTrading,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StrategyType::MaCrossover => "MA Crossover",
            StrategyType::RsiMeanReversion => "RSI Mean Reversion",
            StrategyType::Momentum => "Momentum / Trend Following",
            StrategyType::GridTrading => "Grid Trading",
        }
    }

    /// Daily drift preset used to shape the simulated curve
    pub fn drift(&self) -> f64 {
        match self {
            StrategyType::Momentum => 0.0012,        // higher risk/reward
            StrategyType::RsiMeanReversion => 0.0003, // slower
            StrategyType::MaCrossover | StrategyType::GridTrading => 0.0005,
        }
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Free-text description of current market conditions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInput {
    pub index_level: String,
    pub sentiment: String,
    pub volume_trend: String,
    pub sector_focus: String,
}

impl MarketInput {
    pub fn is_empty(&self) -> bool {
        [
            &self.index_level,
            &self.sentiment,
            &self.volume_trend,
            &self.sector_focus,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAdvice {
    pub signal: Signal,
    pub confidence: u8,
    pub title: String,
    pub reasoning: Vec<String>,
    pub risk_level: RiskLevel,
    pub action_plan: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    #[serde(rename = "javaModel")]
    pub strategy_model_source: String,
    #[serde(rename = "pythonScraper")]
    pub data_fetch_script_source: String,
    pub explanation: String,
}

/// Headline metrics as display strings, the shape the AI service returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationMetrics {
    pub total_return: String,
    pub annualized_return: String,
    pub max_drawdown: String,
    pub sharpe_ratio: String,
}

impl SimulationMetrics {
    pub fn neutral() -> Self {
        Self {
            total_return: "0.00%".to_string(),
            annualized_return: "0.00%".to_string(),
            max_drawdown: "0.00%".to_string(),
            sharpe_ratio: "0.00".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationCommentary {
    pub analysis: String,
    pub metrics: SimulationMetrics,
}

impl SimulationCommentary {
    pub const UNAVAILABLE_TEXT: &'static str =
        "Strategy analysis is temporarily unavailable. Please run the simulation again later.";

    /// Degraded commentary shown when the AI service fails
    pub fn unavailable() -> Self {
        Self {
            analysis: Self::UNAVAILABLE_TEXT.to_string(),
            metrics: SimulationMetrics::neutral(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.analysis == Self::UNAVAILABLE_TEXT
    }
}

/// Quote for a fund on the monitor watchlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundQuote {
    pub id: String,
    pub name: String,
    pub code: String,
    pub price: f64,
    pub change_percent: f64,
    pub volume_label: String,
    pub trend_7d: Vec<f64>,
    pub sector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundAnalysis {
    pub fund_id: String,
    pub signal: Signal,
    pub suggestion: String,
    pub key_reason: String,
}

impl FundAnalysis {
    pub const BUSY_SUGGESTION: &'static str = "Analysis service busy";
    pub const RETRY_REASON: &'static str = "Please retry later";

    /// HOLD placeholder used when the AI service fails
    pub fn fallback(fund_id: impl Into<String>) -> Self {
        Self {
            fund_id: fund_id.into(),
            signal: Signal::Hold,
            suggestion: Self::BUSY_SUGGESTION.to_string(),
            key_reason: Self::RETRY_REASON.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_parameters_validation() {
        assert!(PathParameters::new(365, 0.015, 0.0005).validate().is_ok());
        assert!(PathParameters::new(1, 0.0, 0.0).validate().is_ok());
        assert!(PathParameters::new(0, 0.015, 0.0005).validate().is_err());
        assert!(PathParameters::new(30, -0.01, 0.0005).validate().is_err());
        assert!(PathParameters::new(30, f64::NAN, 0.0005).validate().is_err());
        assert!(PathParameters::new(30, 0.015, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_strategy_drift_presets() {
        assert_eq!(StrategyType::Momentum.drift(), 0.0012);
        assert_eq!(StrategyType::RsiMeanReversion.drift(), 0.0003);
        assert_eq!(StrategyType::MaCrossover.drift(), 0.0005);
        assert_eq!(StrategyType::GridTrading.drift(), 0.0005);
    }

    #[test]
    fn test_signal_wire_format() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        let parsed: Signal = serde_json::from_str("\"HOLD\"").unwrap();
        assert_eq!(parsed, Signal::Hold);
    }

    #[test]
    fn test_price_point_serializes_plain_date() {
        let point = PricePoint {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            strategy_value: 10012.5,
            benchmark_value: 9998.1,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["date"], "2023-01-01");
        assert_eq!(json["strategyValue"], 10012.5);
    }

    #[test]
    fn test_generated_code_wire_names() {
        let json = r#"{"javaModel":"class A {}","pythonScraper":"import requests","explanation":"run it"}"#;
        let code: GeneratedCode = serde_json::from_str(json).unwrap();
        assert_eq!(code.strategy_model_source, "class A {}");
        assert_eq!(code.data_fetch_script_source, "import requests");
    }

    #[test]
    fn test_market_input_is_empty() {
        assert!(MarketInput::default().is_empty());
        let input = MarketInput {
            sentiment: "Fear".to_string(),
            ..Default::default()
        };
        assert!(!input.is_empty());
    }

    #[test]
    fn test_fund_analysis_fallback() {
        let fallback = FundAnalysis::fallback("3");
        assert_eq!(fallback.fund_id, "3");
        assert_eq!(fallback.signal, Signal::Hold);
        assert_eq!(fallback.suggestion, FundAnalysis::BUSY_SUGGESTION);
        assert_eq!(fallback.key_reason, FundAnalysis::RETRY_REASON);
    }
}
