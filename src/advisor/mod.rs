// Generative-AI advisory boundary
pub mod actions;
pub mod gemini;
pub mod offline;
pub mod prompts;

pub use actions::{analyze_fund_or_hold, generate_strategy_code, request_market_advice};
pub use gemini::GeminiClient;
pub use offline::OfflineAdvisor;

use crate::error::ServiceError;
use crate::models::{
    FundAnalysis, FundQuote, GeneratedCode, MarketAdvice, MarketInput, SimulationCommentary,
};
use async_trait::async_trait;
use serde::Serialize;

/// Strategy code generation request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRequest {
    pub strategy_description: String,
    pub indicators: Vec<String>,
}

/// Backtest commentary request. `params` is forwarded verbatim into the prompt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentaryRequest {
    pub strategy_label: String,
    pub params: serde_json::Value,
}

/// Snapshot of a single fund sent for a quick signal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundAnalysisRequest {
    pub id: String,
    pub name: String,
    pub change_percent: f64,
    pub volume_label: String,
    pub recent_trend: Vec<f64>,
}

impl From<&FundQuote> for FundAnalysisRequest {
    fn from(quote: &FundQuote) -> Self {
        Self {
            id: quote.id.clone(),
            name: quote.name.clone(),
            change_percent: quote.change_percent,
            volume_label: quote.volume_label.clone(),
            recent_trend: quote.trend_7d.clone(),
        }
    }
}

/// Capability interface over the text/JSON completion service.
///
/// One method per request shape. Production binds `GeminiClient`;
/// `OfflineAdvisor` answers locally without network access.
#[async_trait]
pub trait AdvisorBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    async fn generate_code(&self, request: &CodeRequest) -> Result<GeneratedCode, ServiceError>;

    async fn simulation_commentary(
        &self,
        request: &CommentaryRequest,
    ) -> Result<SimulationCommentary, ServiceError>;

    async fn market_advice(&self, input: &MarketInput) -> Result<MarketAdvice, ServiceError>;

    async fn analyze_fund(
        &self,
        request: &FundAnalysisRequest,
    ) -> Result<FundAnalysis, ServiceError>;
}
