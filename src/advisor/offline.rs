use super::{AdvisorBackend, CodeRequest, CommentaryRequest, FundAnalysisRequest};
use crate::error::ServiceError;
use crate::models::{
    FundAnalysis, GeneratedCode, MarketAdvice, MarketInput, RiskLevel, Signal,
    SimulationCommentary, SimulationMetrics,
};
use async_trait::async_trait;

/// 7-day move (as a fraction) that counts as a trend
const TREND_THRESHOLD: f64 = 0.02;

const BULLISH_WORDS: &[&str] = &[
    "fear", "panic", "oversold", "capitulation", "low", "bottom", "cheap", "rebound",
];
const BEARISH_WORDS: &[&str] = &[
    "greed", "euphoria", "overbought", "bubble", "high", "top", "frenzy", "crash",
];
const HEAVY_VOLUME_WORDS: &[&str] = &["increasing", "heavy", "surge", "expanding", "rising"];

/// Rule-based stand-in for the AI service.
///
/// Answers are derived from the request alone, so identical requests always
/// produce identical answers. Used when no API key is configured.
#[derive(Debug, Clone, Default)]
pub struct OfflineAdvisor;

impl OfflineAdvisor {
    pub fn new() -> Self {
        Self
    }
}

/// Number of `words` present in `text` as whole words
fn keyword_hits(text: &str, words: &[&str]) -> i32 {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    words.iter().filter(|w| tokens.contains(*w)).count() as i32
}

/// Fractional change from the first to the last value of a trend
fn trend_change(trend: &[f64]) -> f64 {
    match (trend.first(), trend.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

fn class_name(description: &str) -> String {
    let name: String = description
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(3)
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect();

    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        "CustomStrategy".to_string()
    } else {
        format!("{}Strategy", name)
    }
}

#[async_trait]
impl AdvisorBackend for OfflineAdvisor {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate_code(&self, request: &CodeRequest) -> Result<GeneratedCode, ServiceError> {
        let class = class_name(&request.strategy_description);
        let indicator_fields: String = request
            .indicators
            .iter()
            .map(|i| format!("    // indicator: {}\n", i))
            .collect();

        let strategy_model_source = format!(
            r#"import java.util.List;

/** {description} */
public interface Strategy {{
    Signal onBar(List<Double> closes);

    enum Signal {{ BUY, SELL, HOLD }}
}}

class {class} implements Strategy {{
{indicator_fields}
    @Override
    public Signal onBar(List<Double> closes) {{
        // entry and exit rules go here
        return Signal.HOLD;
    }}
}}

class BacktestEngine {{
    private final Strategy strategy;

    BacktestEngine(Strategy strategy) {{
        this.strategy = strategy;
    }}

    double run(List<Double> navHistory, double initialCapital) {{
        return initialCapital;
    }}
}}
"#,
            description = request.strategy_description,
            class = class,
            indicator_fields = indicator_fields,
        );

        let data_fetch_script_source = r#"import time

import pandas as pd
import requests

NAV_URL = "https://example.com/api/fund/{code}/nav"


def fetch_nav(code: str, retries: int = 3) -> pd.DataFrame:
    for attempt in range(1, retries + 1):
        try:
            resp = requests.get(NAV_URL.format(code=code), timeout=10)
            resp.raise_for_status()
            return pd.DataFrame(resp.json()["data"])
        except (requests.RequestException, KeyError):
            if attempt == retries:
                raise
            time.sleep(2 ** attempt)
    return pd.DataFrame()


if __name__ == "__main__":
    fetch_nav("005827").to_csv("nav_005827.csv", index=False)
"#
        .to_string();

        let explanation = format!(
            "## Offline template\n\nGenerated without the AI service. `{}` is a skeleton for: {}.\n\n1. Run `python fetch_nav.py` to download NAV history as CSV.\n2. Load the CSV into `BacktestEngine` and fill in `onBar`.",
            class, request.strategy_description
        );

        Ok(GeneratedCode {
            strategy_model_source,
            data_fetch_script_source,
            explanation,
        })
    }

    async fn simulation_commentary(
        &self,
        request: &CommentaryRequest,
    ) -> Result<SimulationCommentary, ServiceError> {
        let duration = request
            .params
            .get("duration")
            .and_then(|d| d.as_u64())
            .unwrap_or(0);

        let metrics = request
            .params
            .get("observed")
            .cloned()
            .and_then(|v| serde_json::from_value::<SimulationMetrics>(v).ok())
            .unwrap_or_else(SimulationMetrics::neutral);

        let tone = if metrics.total_return.starts_with('-') {
            "underperformed its starting capital, which suggests the rules fight the prevailing trend"
        } else {
            "finished above its starting capital, but the curve is synthetic and only shows the shape of the risk"
        };

        let analysis = format!(
            "Offline review of {} over {} days: the simulated curve {}. Max drawdown was {}; size positions so that a drawdown of this depth is tolerable before relying on the strategy.",
            request.strategy_label, duration, tone, metrics.max_drawdown
        );

        Ok(SimulationCommentary { analysis, metrics })
    }

    async fn market_advice(&self, input: &MarketInput) -> Result<MarketAdvice, ServiceError> {
        let context = format!("{} {}", input.index_level, input.sentiment);
        // Contrarian: fear is an opportunity, greed is a risk
        let score = keyword_hits(&context, BULLISH_WORDS) - keyword_hits(&context, BEARISH_WORDS);
        let heavy_volume = keyword_hits(&input.volume_trend, HEAVY_VOLUME_WORDS) > 0;

        let signal = match score {
            s if s > 0 => Signal::Buy,
            s if s < 0 => Signal::Sell,
            _ => Signal::Hold,
        };

        let base = 50 + 10 * score.abs().min(3);
        let confidence = if heavy_volume && signal != Signal::Hold {
            base + 10
        } else {
            base
        };

        let risk_level = match (signal, heavy_volume) {
            (Signal::Sell, _) => RiskLevel::High,
            (Signal::Buy, true) => RiskLevel::Medium,
            (Signal::Buy, false) => RiskLevel::Low,
            (Signal::Hold, _) => RiskLevel::Medium,
        };

        let (title, action_plan) = match signal {
            Signal::Buy => (
                "Contrarian entry window",
                "Build positions in tranches over the next two weeks and keep cash for a second leg down.",
            ),
            Signal::Sell => (
                "Sentiment overheated, reduce risk",
                "Trim equity exposure and rotate gains into short-duration bond funds.",
            ),
            Signal::Hold => (
                "No clear edge, stay patient",
                "Keep current allocation and wait for sentiment or volume to confirm a direction.",
            ),
        };

        let reasoning = vec![
            format!("Index level/trend reported as '{}'.", input.index_level),
            format!(
                "Sentiment '{}' reads as {} on a contrarian basis.",
                input.sentiment,
                match signal {
                    Signal::Buy => "supportive",
                    Signal::Sell => "stretched",
                    Signal::Hold => "neutral",
                }
            ),
            format!(
                "Volume is '{}' with focus on {}{}.",
                input.volume_trend,
                input.sector_focus,
                if heavy_volume { ", confirming the move" } else { "" }
            ),
        ];

        Ok(MarketAdvice {
            signal,
            confidence: confidence.clamp(0, 100) as u8,
            title: title.to_string(),
            reasoning,
            risk_level,
            action_plan: action_plan.to_string(),
        })
    }

    async fn analyze_fund(
        &self,
        request: &FundAnalysisRequest,
    ) -> Result<FundAnalysis, ServiceError> {
        let change = trend_change(&request.recent_trend);

        let (signal, suggestion, key_reason) = if change > TREND_THRESHOLD && request.change_percent > 0.0 {
            (
                Signal::Buy,
                "Ride the trend",
                format!("7-day trend is up {:.1}% and today's move confirms it.", change * 100.0),
            )
        } else if change < -TREND_THRESHOLD && request.change_percent < 0.0 {
            (
                Signal::Sell,
                "Cut losses",
                format!("7-day trend is down {:.1}% with no sign of a bounce today.", change.abs() * 100.0),
            )
        } else {
            (
                Signal::Hold,
                "Wait and see",
                format!("7-day move of {:+.1}% is not decisive.", change * 100.0),
            )
        };

        Ok(FundAnalysis {
            fund_id: request.id.clone(),
            signal,
            suggestion: suggestion.to_string(),
            key_reason,
        })
    }
}
