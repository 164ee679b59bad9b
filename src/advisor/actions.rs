use super::{AdvisorBackend, CodeRequest, FundAnalysisRequest};
use crate::error::Error;
use crate::models::{FundAnalysis, GeneratedCode, MarketAdvice, MarketInput};
use crate::Result;

/// Number of reasons the advice prompt asks for
const EXPECTED_REASONS: usize = 3;

/// Generate strategy and data-fetch source code for a described strategy.
///
/// Service failures propagate so the caller can surface them and let the
/// user retry.
pub async fn generate_strategy_code(
    backend: &dyn AdvisorBackend,
    description: &str,
    indicators: &[String],
) -> Result<GeneratedCode> {
    let description = description.trim();
    if description.is_empty() {
        return Err(Error::validation("strategy description must not be empty"));
    }

    let request = CodeRequest {
        strategy_description: description.to_string(),
        indicators: indicators
            .iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect(),
    };

    tracing::info!(
        backend = backend.name(),
        indicators = request.indicators.len(),
        "Requesting strategy code"
    );

    backend.generate_code(&request).await.map_err(|e| {
        tracing::error!(error = %e, "Code generation failed");
        Error::from(e)
    })
}

/// Ask for a BUY/SELL/HOLD call on the described market conditions
pub async fn request_market_advice(
    backend: &dyn AdvisorBackend,
    input: &MarketInput,
) -> Result<MarketAdvice> {
    if input.is_empty() {
        return Err(Error::validation("describe at least one market condition"));
    }

    let mut advice = backend.market_advice(input).await.map_err(|e| {
        tracing::error!(error = %e, "Advice generation failed");
        Error::from(e)
    })?;

    advice.confidence = advice.confidence.min(100);
    if advice.reasoning.len() != EXPECTED_REASONS {
        tracing::warn!(
            reasons = advice.reasoning.len(),
            expected = EXPECTED_REASONS,
            "Advice has an unexpected number of reasons"
        );
    }

    tracing::info!(
        signal = %advice.signal,
        confidence = advice.confidence,
        "Market advice received"
    );

    Ok(advice)
}

/// Quick signal for one fund. Never fails: on a service error the result is
/// a HOLD placeholder asking the user to retry.
pub async fn analyze_fund_or_hold(
    backend: &dyn AdvisorBackend,
    request: &FundAnalysisRequest,
) -> FundAnalysis {
    match backend.analyze_fund(request).await {
        Ok(mut analysis) => {
            analysis.fund_id = request.id.clone();
            analysis
        }
        Err(e) => {
            tracing::warn!(
                fund_id = %request.id,
                error = %e,
                "Fund analysis failed, defaulting to HOLD"
            );
            FundAnalysis::fallback(request.id.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{CommentaryRequest, OfflineAdvisor};
    use crate::error::ServiceError;
    use crate::models::{RiskLevel, Signal, SimulationCommentary};
    use async_trait::async_trait;

    /// Backend whose every call fails
    struct DownBackend;

    #[async_trait]
    impl AdvisorBackend for DownBackend {
        fn name(&self) -> &str {
            "down"
        }

        async fn generate_code(
            &self,
            _request: &CodeRequest,
        ) -> std::result::Result<GeneratedCode, ServiceError> {
            Err(ServiceError::Unavailable("down".to_string()))
        }

        async fn simulation_commentary(
            &self,
            _request: &CommentaryRequest,
        ) -> std::result::Result<SimulationCommentary, ServiceError> {
            Err(ServiceError::Unavailable("down".to_string()))
        }

        async fn market_advice(
            &self,
            _input: &MarketInput,
        ) -> std::result::Result<MarketAdvice, ServiceError> {
            Err(ServiceError::Unavailable("down".to_string()))
        }

        async fn analyze_fund(
            &self,
            _request: &FundAnalysisRequest,
        ) -> std::result::Result<FundAnalysis, ServiceError> {
            Err(ServiceError::Status {
                status: 503,
                body: "overloaded".to_string(),
            })
        }
    }

    /// Backend returning fixed answers with a wrong fund id and too few reasons
    struct SloppyBackend;

    #[async_trait]
    impl AdvisorBackend for SloppyBackend {
        fn name(&self) -> &str {
            "sloppy"
        }

        async fn generate_code(
            &self,
            request: &CodeRequest,
        ) -> std::result::Result<GeneratedCode, ServiceError> {
            Ok(GeneratedCode {
                strategy_model_source: request.strategy_description.clone(),
                data_fetch_script_source: request.indicators.join(","),
                explanation: String::new(),
            })
        }

        async fn simulation_commentary(
            &self,
            _request: &CommentaryRequest,
        ) -> std::result::Result<SimulationCommentary, ServiceError> {
            Ok(SimulationCommentary::unavailable())
        }

        async fn market_advice(
            &self,
            _input: &MarketInput,
        ) -> std::result::Result<MarketAdvice, ServiceError> {
            Ok(MarketAdvice {
                signal: Signal::Hold,
                confidence: 250,
                title: "t".to_string(),
                reasoning: vec!["only one".to_string()],
                risk_level: RiskLevel::Low,
                action_plan: "p".to_string(),
            })
        }

        async fn analyze_fund(
            &self,
            _request: &FundAnalysisRequest,
        ) -> std::result::Result<FundAnalysis, ServiceError> {
            Ok(FundAnalysis {
                fund_id: "wrong".to_string(),
                signal: Signal::Buy,
                suggestion: "s".to_string(),
                key_reason: "k".to_string(),
            })
        }
    }

    fn fund_request() -> FundAnalysisRequest {
        FundAnalysisRequest {
            id: "4".to_string(),
            name: "New Energy ETF".to_string(),
            change_percent: 2.5,
            volume_label: "Surging".to_string(),
            recent_trend: vec![0.92, 0.93, 0.95, 0.94, 0.96, 0.97, 0.98],
        }
    }

    #[tokio::test]
    async fn test_fund_analysis_falls_back_to_hold() {
        let result = analyze_fund_or_hold(&DownBackend, &fund_request()).await;

        assert_eq!(result, FundAnalysis::fallback("4"));
    }

    #[tokio::test]
    async fn test_fund_analysis_forces_requested_id() {
        let result = analyze_fund_or_hold(&SloppyBackend, &fund_request()).await;

        assert_eq!(result.fund_id, "4");
        assert_eq!(result.signal, Signal::Buy);
    }

    #[tokio::test]
    async fn test_code_generation_requires_description() {
        let result = generate_strategy_code(&OfflineAdvisor::new(), "   ", &[]).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_code_generation_trims_indicators() {
        let indicators = vec![" RSI ".to_string(), "".to_string(), "MACD".to_string()];
        let code = generate_strategy_code(&SloppyBackend, " mean reversion ", &indicators)
            .await
            .unwrap();

        assert_eq!(code.strategy_model_source, "mean reversion");
        assert_eq!(code.data_fetch_script_source, "RSI,MACD");
    }

    #[tokio::test]
    async fn test_code_generation_propagates_service_error() {
        let result = generate_strategy_code(&DownBackend, "grid", &[]).await;

        let err = result.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_market_advice_requires_input() {
        let result = request_market_advice(&OfflineAdvisor::new(), &MarketInput::default()).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_market_advice_clamps_confidence() {
        let input = MarketInput {
            sentiment: "Neutral".to_string(),
            ..Default::default()
        };
        let advice = request_market_advice(&SloppyBackend, &input).await.unwrap();

        assert_eq!(advice.confidence, 100);
    }

    #[tokio::test]
    async fn test_market_advice_propagates_service_error() {
        let input = MarketInput {
            sentiment: "Fear".to_string(),
            ..Default::default()
        };
        let result = request_market_advice(&DownBackend, &input).await;

        assert!(matches!(result, Err(Error::ExternalService(_))));
    }
}
