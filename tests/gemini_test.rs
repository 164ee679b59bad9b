use fundlab::advisor::{
    analyze_fund_or_hold, generate_strategy_code, request_market_advice, AdvisorBackend,
    CommentaryRequest, FundAnalysisRequest, GeminiClient,
};
use fundlab::settings::GeminiSettings;
use fundlab::{Error, FundAnalysis, MarketInput, RiskLevel, ServiceError, Signal};
use serde_json::json;

const FLASH_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";
const PRO_PATH: &str = "/v1beta/models/gemini-3-pro-preview:generateContent";

fn client_for(server: &mockito::Server) -> GeminiClient {
    let settings = GeminiSettings {
        api_key: Some("test-key".to_string()),
        base_url: server.url(),
        timeout_secs: 5,
        requests_per_minute: 600,
        ..GeminiSettings::default()
    };
    GeminiClient::new(&settings).unwrap()
}

/// Wrap model output text in a generateContent response envelope
fn envelope(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn liquor_fund() -> FundAnalysisRequest {
    FundAnalysisRequest {
        id: "1".to_string(),
        name: "China Merchants CSI Liquor".to_string(),
        change_percent: 1.2,
        volume_label: "Expanding".to_string(),
        recent_trend: vec![1.1, 1.12, 1.15, 1.14, 1.18, 1.2, 1.24],
    }
}

#[tokio::test]
async fn test_fund_analysis_parses_response() {
    let mut server = mockito::Server::new_async().await;
    let inner = json!({
        "fundId": "model-made-this-up",
        "signal": "BUY",
        "suggestion": "Add on dips",
        "keyReason": "Volume expanding with a rising 7-day trend"
    });
    let mock = server
        .mock("POST", FLASH_PATH)
        .match_header("x-goog-api-key", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(&inner.to_string()))
        .create_async()
        .await;

    let client = client_for(&server);
    let analysis = client.analyze_fund(&liquor_fund()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(analysis.fund_id, "1");
    assert_eq!(analysis.signal, Signal::Buy);
    assert_eq!(analysis.suggestion, "Add on dips");
}

#[tokio::test]
async fn test_http_error_maps_to_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", FLASH_PATH)
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let client = client_for(&server);
    let request = CommentaryRequest {
        strategy_label: "Grid Trading".to_string(),
        params: json!({ "initialCapital": 10000.0, "duration": 365 }),
    };
    let result = client.simulation_commentary(&request).await;

    match result {
        Err(ServiceError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal error");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_json_maps_to_parse() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", FLASH_PATH)
        .with_status(200)
        .with_body(envelope("{\"analysis\": \"cut off mid-sen"))
        .create_async()
        .await;

    let client = client_for(&server);
    let request = CommentaryRequest {
        strategy_label: "Momentum / Trend Following".to_string(),
        params: json!({}),
    };
    let result = client.simulation_commentary(&request).await;

    assert!(matches!(result, Err(ServiceError::Parse(_))));
}

#[tokio::test]
async fn test_empty_candidates_map_to_empty_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", FLASH_PATH)
        .with_status(200)
        .with_body(r#"{"candidates":[]}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let result = client.analyze_fund(&liquor_fund()).await;

    assert!(matches!(result, Err(ServiceError::EmptyResponse)));
}

#[tokio::test]
async fn test_service_failure_yields_hold_fallback() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", FLASH_PATH)
        .with_status(503)
        .with_body("overloaded")
        .create_async()
        .await;

    let client = client_for(&server);
    let analysis = analyze_fund_or_hold(&client, &liquor_fund()).await;

    assert_eq!(analysis, FundAnalysis::fallback("1"));
    assert_eq!(analysis.signal, Signal::Hold);
    assert_eq!(analysis.suggestion, FundAnalysis::BUSY_SUGGESTION);
    assert_eq!(analysis.key_reason, FundAnalysis::RETRY_REASON);
}

#[tokio::test]
async fn test_market_advice_accepts_fenced_output() {
    let mut server = mockito::Server::new_async().await;
    let inner = json!({
        "signal": "HOLD",
        "confidence": 62.6,
        "title": "Wait for volume to confirm",
        "reasoning": ["Index is range-bound", "Sentiment is mixed", "Volume is thin"],
        "riskLevel": "Medium",
        "actionPlan": "Keep 50% cash and add only on a breakout"
    });
    let _mock = server
        .mock("POST", FLASH_PATH)
        .with_status(200)
        .with_body(envelope(&format!("```json\n{}\n```", inner)))
        .create_async()
        .await;

    let client = client_for(&server);
    let input = MarketInput {
        index_level: "3050, consolidating".to_string(),
        sentiment: "cautious".to_string(),
        ..MarketInput::default()
    };
    let advice = request_market_advice(&client, &input).await.unwrap();

    assert_eq!(advice.signal, Signal::Hold);
    assert_eq!(advice.confidence, 63);
    assert_eq!(advice.risk_level, RiskLevel::Medium);
    assert_eq!(advice.reasoning.len(), 3);
}

#[tokio::test]
async fn test_code_generation_uses_code_model_and_propagates_errors() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("POST", PRO_PATH)
        .with_status(200)
        .with_body(envelope(
            &json!({
                "javaModel": "public interface Strategy {}",
                "pythonScraper": "import requests",
                "explanation": "Run the scraper first."
            })
            .to_string(),
        ))
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let code = generate_strategy_code(&client, "Buy the 5/20 golden cross", &["SMA".to_string()])
        .await
        .unwrap();

    ok.assert_async().await;
    assert_eq!(code.strategy_model_source, "public interface Strategy {}");
    assert_eq!(code.data_fetch_script_source, "import requests");

    ok.remove_async().await;
    let _down = server
        .mock("POST", PRO_PATH)
        .with_status(429)
        .with_body("quota")
        .create_async()
        .await;

    let result = generate_strategy_code(&client, "Buy the 5/20 golden cross", &[]).await;
    assert!(matches!(
        result,
        Err(Error::ExternalService(ServiceError::Status { status: 429, .. }))
    ));
}
