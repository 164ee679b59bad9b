//! Prompt text and response schemas for each advisory request
use super::{CodeRequest, CommentaryRequest, FundAnalysisRequest};
use crate::models::MarketInput;
use serde_json::{json, Value};

pub fn code_generation_prompt(request: &CodeRequest) -> String {
    let indicators = if request.indicators.is_empty() {
        "any indicators you consider appropriate".to_string()
    } else {
        request.indicators.join(", ")
    };

    format!(
        r#"You are a senior quantitative developer. The user is building a fund trading system.

Requirements:
1. **Java (strategy model)**: Write a complete, production-ready Java class structure implementing this strategy: "{description}".
   - Include a 'Strategy' interface.
   - Include an implementation class that uses these indicators: {indicators}.
   - Include a basic 'BacktestEngine' class stub.
   - Use strict types and comment the key logic.

2. **Python (data fetcher)**: Write a robust Python script that downloads fund NAV (net asset value) history.
   - Use 'requests' and 'pandas'.
   - Assume a generic public fund-data JSON API or HTML table.
   - Include error handling and retry logic.
   - Save the data as CSV.

3. **Explanation**: Briefly explain in Markdown how to run the system.

Respond ONLY with valid JSON (no markdown, no code blocks):
{{
  "javaModel": "full Java source...",
  "pythonScraper": "full Python source...",
  "explanation": "Markdown explanation..."
}}"#,
        description = request.strategy_description,
        indicators = indicators,
    )
}

pub fn code_generation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "javaModel": { "type": "STRING" },
            "pythonScraper": { "type": "STRING" },
            "explanation": { "type": "STRING" }
        },
        "required": ["javaModel", "pythonScraper", "explanation"]
    })
}

pub fn commentary_prompt(request: &CommentaryRequest) -> String {
    format!(
        r#"Act as a quantitative analyst.
Analyze a simulated fund backtest for the strategy "{label}" with these parameters: {params}.

1. Write a realistic analysis explaining why this strategy may succeed or fail in the current market environment.
2. Estimate realistic performance metrics for the next year (total return, annualized return, max drawdown, Sharpe ratio).

Respond ONLY with valid JSON:
{{
  "analysis": "Detailed market analysis...",
  "metrics": {{
    "totalReturn": "+15.4%",
    "annualizedReturn": "15.4%",
    "maxDrawdown": "-8.2%",
    "sharpeRatio": "1.8"
  }}
}}"#,
        label = request.strategy_label,
        params = request.params,
    )
}

pub fn commentary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "analysis": { "type": "STRING" },
            "metrics": {
                "type": "OBJECT",
                "properties": {
                    "totalReturn": { "type": "STRING" },
                    "annualizedReturn": { "type": "STRING" },
                    "maxDrawdown": { "type": "STRING" },
                    "sharpeRatio": { "type": "STRING" }
                },
                "required": ["totalReturn", "annualizedReturn", "maxDrawdown", "sharpeRatio"]
            }
        },
        "required": ["analysis", "metrics"]
    })
}

pub fn market_advice_prompt(input: &MarketInput) -> String {
    format!(
        r#"Role: Senior Fund Manager & Market Analyst.
Task: Analyze the current market conditions provided by the user and give a clear Buy/Sell/Hold recommendation for a general equity fund portfolio.

User Input Market Data:
- Index Level/Trend: {index_level}
- Market Sentiment: {sentiment}
- Trading Volume: {volume_trend}
- Key Sector Performance: {sector_focus}

Requirements:
1. Determine a signal: BUY (Opportunity), SELL (Risk), or HOLD (Observation).
2. Provide a confidence score (0-100).
3. List exactly 3 specific reasons.
4. Determine the risk level.
5. Provide a short, actionable plan.

Output JSON Schema:
{{
  "signal": "BUY" | "SELL" | "HOLD",
  "confidence": number,
  "title": "Short headline",
  "reasoning": ["Reason 1", "Reason 2", "Reason 3"],
  "riskLevel": "Low" | "Medium" | "High",
  "actionPlan": "Specific action advice"
}}"#,
        index_level = input.index_level,
        sentiment = input.sentiment,
        volume_trend = input.volume_trend,
        sector_focus = input.sector_focus,
    )
}

pub fn market_advice_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "signal": { "type": "STRING", "enum": ["BUY", "SELL", "HOLD"] },
            "confidence": { "type": "NUMBER" },
            "title": { "type": "STRING" },
            "reasoning": { "type": "ARRAY", "items": { "type": "STRING" } },
            "riskLevel": { "type": "STRING", "enum": ["Low", "Medium", "High"] },
            "actionPlan": { "type": "STRING" }
        },
        "required": ["signal", "confidence", "title", "reasoning", "riskLevel", "actionPlan"]
    })
}

pub fn fund_analysis_prompt(request: &FundAnalysisRequest) -> String {
    let trend = serde_json::to_string(&request.recent_trend).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"Role: High-Frequency Trading Algorithm.
Task: Analyze specific fund data and give a quick technical decision.

Fund Data:
- Name: {name}
- Current Change: {change:.2}%
- Volume Status: {volume}
- Recent Trend (7 days): {trend}

Requirements:
1. Signal: BUY (bottom fishing / trend following), SELL (stop loss / profit taking), or HOLD.
2. Suggestion: very short, punchy text (max 15 characters).
3. Key Reason: one sentence technical reason.

Output JSON:
{{
  "fundId": "{id}",
  "signal": "BUY" | "SELL" | "HOLD",
  "suggestion": "Short text",
  "keyReason": "Detailed reason"
}}"#,
        name = request.name,
        change = request.change_percent,
        volume = request.volume_label,
        trend = trend,
        id = request.id,
    )
}

pub fn fund_analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "fundId": { "type": "STRING" },
            "signal": { "type": "STRING", "enum": ["BUY", "SELL", "HOLD"] },
            "suggestion": { "type": "STRING" },
            "keyReason": { "type": "STRING" }
        },
        "required": ["signal", "suggestion", "keyReason"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_prompt_lists_indicators() {
        let request = CodeRequest {
            strategy_description: "Buy when the 5-day MA crosses above the 20-day MA".to_string(),
            indicators: vec!["SMA".to_string(), "RSI".to_string()],
        };
        let prompt = code_generation_prompt(&request);

        assert!(prompt.contains("5-day MA crosses above"));
        assert!(prompt.contains("SMA, RSI"));
        assert!(prompt.contains("\"javaModel\""));
    }

    #[test]
    fn test_commentary_prompt_embeds_params() {
        let request = CommentaryRequest {
            strategy_label: "Grid Trading".to_string(),
            params: json!({ "initialCapital": 10000.0, "duration": 365 }),
        };
        let prompt = commentary_prompt(&request);

        assert!(prompt.contains("\"Grid Trading\""));
        assert!(prompt.contains("\"duration\":365"));
    }

    #[test]
    fn test_fund_prompt_formats_change() {
        let request = FundAnalysisRequest {
            id: "2".to_string(),
            name: "Growth Mixed".to_string(),
            change_percent: -0.8,
            volume_label: "Shrinking".to_string(),
            recent_trend: vec![2.2, 2.18, 2.15],
        };
        let prompt = fund_analysis_prompt(&request);

        assert!(prompt.contains("Current Change: -0.80%"));
        assert!(prompt.contains("[2.2,2.18,2.15]"));
        assert!(prompt.contains("\"fundId\": \"2\""));
    }

    #[test]
    fn test_schemas_restrict_signal_values() {
        let schema = market_advice_schema();
        assert_eq!(schema["properties"]["signal"]["enum"], json!(["BUY", "SELL", "HOLD"]));
        assert_eq!(fund_analysis_schema()["properties"]["signal"]["type"], "STRING");
    }
}
