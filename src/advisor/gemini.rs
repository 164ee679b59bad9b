//! Gemini `generateContent` binding for the advisory boundary
//!
//! Every request asks for `application/json` output constrained by a
//! response schema. Failures are returned to the caller; nothing is retried.
use super::prompts;
use super::{AdvisorBackend, CodeRequest, CommentaryRequest, FundAnalysisRequest};
use crate::error::{Error, ServiceError};
use crate::models::{
    FundAnalysis, GeneratedCode, MarketAdvice, MarketInput, RiskLevel, Signal,
    SimulationCommentary,
};
use crate::settings::GeminiSettings;
use crate::Result;
use async_trait::async_trait;
use config::ConfigError;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

// Type alias for the rate limiter to simplify signatures
type GeminiRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Market advice as returned on the wire; confidence may arrive as a float
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdviceResponse {
    signal: Signal,
    confidence: f64,
    title: String,
    reasoning: Vec<String>,
    risk_level: RiskLevel,
    action_plan: String,
}

impl From<AdviceResponse> for MarketAdvice {
    fn from(wire: AdviceResponse) -> Self {
        let confidence = if wire.confidence.is_finite() {
            wire.confidence.round().clamp(0.0, 100.0) as u8
        } else {
            0
        };

        MarketAdvice {
            signal: wire.signal,
            confidence,
            title: wire.title,
            reasoning: wire.reasoning,
            risk_level: wire.risk_level,
            action_plan: wire.action_plan,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundAnalysisResponse {
    signal: Signal,
    suggestion: String,
    key_reason: String,
}

/// Gemini API client with client-side rate limiting
///
/// Cloneable; all clones share the same rate limiter.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    code_model: String,
    default_model: String,
    rate_limiter: Arc<GeminiRateLimiter>,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config(ConfigError::NotFound("gemini.api_key".to_string())))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ServiceError::from)?;

        let rpm = NonZeroU32::new(settings.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            code_model: settings.code_model.clone(),
            default_model: settings.default_model.clone(),
            rate_limiter,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    /// Send one prompt and parse the first candidate's text as `T`
    async fn generate_json<T: DeserializeOwned>(
        &self,
        model: &str,
        prompt: String,
        schema: serde_json::Value,
    ) -> std::result::Result<T, ServiceError> {
        self.rate_limiter.until_ready().await;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            },
        };

        tracing::debug!(model = %model, "Sending generateContent request");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", self.api_key.as_str())
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(model = %model, status = %status, "Gemini request failed");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse = response.json().await?;
        let text = first_candidate_text(payload).ok_or(ServiceError::EmptyResponse)?;

        Ok(serde_json::from_str(strip_code_fences(&text))?)
    }
}

fn first_candidate_text(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Strip markdown code fences (```json ... ``` or ``` ... ```)
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    trimmed
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[async_trait]
impl AdvisorBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_code(
        &self,
        request: &CodeRequest,
    ) -> std::result::Result<GeneratedCode, ServiceError> {
        self.generate_json(
            &self.code_model,
            prompts::code_generation_prompt(request),
            prompts::code_generation_schema(),
        )
        .await
    }

    async fn simulation_commentary(
        &self,
        request: &CommentaryRequest,
    ) -> std::result::Result<SimulationCommentary, ServiceError> {
        self.generate_json(
            &self.default_model,
            prompts::commentary_prompt(request),
            prompts::commentary_schema(),
        )
        .await
    }

    async fn market_advice(
        &self,
        input: &MarketInput,
    ) -> std::result::Result<MarketAdvice, ServiceError> {
        let wire: AdviceResponse = self
            .generate_json(
                &self.default_model,
                prompts::market_advice_prompt(input),
                prompts::market_advice_schema(),
            )
            .await?;
        Ok(wire.into())
    }

    async fn analyze_fund(
        &self,
        request: &FundAnalysisRequest,
    ) -> std::result::Result<FundAnalysis, ServiceError> {
        let wire: FundAnalysisResponse = self
            .generate_json(
                &self.default_model,
                prompts::fund_analysis_prompt(request),
                prompts::fund_analysis_schema(),
            )
            .await?;

        Ok(FundAnalysis {
            fund_id: request.id.clone(),
            signal: wire.signal,
            suggestion: wire.suggestion,
            key_reason: wire.key_reason,
        })
    }
}
