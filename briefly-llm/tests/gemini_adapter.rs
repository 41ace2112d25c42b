mod common;

use briefly_common::Secret;
use briefly_llm::gemini::GeminiClient;
use briefly_llm::traits::{FailureKind, GenerationParams, LlmClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.0-flash";
const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::with_endpoint(Secret::new("test-key"), MODEL.to_string(), &server.uri())
        .expect("client builds")
}

#[tokio::test]
async fn sends_prompt_with_sampling_and_safety_settings() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "Summarize this"}]}],
            "generationConfig": {"topK": 40, "candidateCount": 1, "maxOutputTokens": 512},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "# Report\n\n"}, {"text": "Body."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 42},
            "modelVersion": "gemini-2.0-flash-001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = GenerationParams {
        max_output_tokens: 512,
        ..Default::default()
    };
    let resp = client_for(&server)
        .generate("Summarize this", &params)
        .await
        .expect("generation succeeds");

    assert_eq!(resp.text, "# Report\n\nBody.");
    assert_eq!(resp.tokens_used, Some(42));
    assert_eq!(resp.model.as_deref(), Some("gemini-2.0-flash-001"));

    let received = server.received_requests().await.unwrap_or_default();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let settings = body["safetySettings"].as_array().unwrap();
    assert_eq!(settings.len(), 4);
    assert!(settings
        .iter()
        .all(|s| s["threshold"] == "BLOCK_MEDIUM_AND_ABOVE"));
}

#[tokio::test]
async fn blocked_prompt_is_a_safety_failure() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate("anything", &GenerationParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Safety);
}

#[tokio::test]
async fn safety_finish_reason_is_a_safety_failure() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"finishReason": "SAFETY"}]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate("anything", &GenerationParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Safety);
}

#[tokio::test]
async fn provider_statuses_map_onto_failure_kinds() {
    common::init_test_tracing();

    let cases = [
        (
            400,
            json!({"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}),
            FailureKind::Auth,
        ),
        (
            429,
            json!({"error": {"code": 429, "message": "You exceeded your current quota", "status": "RESOURCE_EXHAUSTED"}}),
            FailureKind::Quota,
        ),
        (
            429,
            json!({"error": {"code": 429, "message": "Too many requests", "status": "RESOURCE_EXHAUSTED"}}),
            FailureKind::RateLimited,
        ),
        (
            503,
            json!({"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}}),
            FailureKind::Transient,
        ),
    ];

    for (status, body, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate("anything", &GenerationParams::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), expected, "status {status}");
    }
}

#[tokio::test]
async fn empty_candidate_text_is_unexpected() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "  "}]}, "finishReason": "STOP"}]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate("anything", &GenerationParams::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Unexpected);
    assert!(!err.is_retryable());
}
