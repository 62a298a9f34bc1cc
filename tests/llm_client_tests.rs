//! Mock-based tests for the OpenAI-compatible chat client
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paperscout::config::LlmConfig;
use paperscout::llm::{LanguageModel, OpenAiChat};
use paperscout::prompts::paper_selection::response_schema;
use paperscout::ScoutError;

fn config(uri: &str) -> LlmConfig {
    LlmConfig {
        base_url: uri.to_string(),
        api_key: "sk-test".to_string(),
        model: "test-model".to_string(),
        temperature: 0.0,
        timeout: Duration::from_secs(5),
    }
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    })
}

#[tokio::test]
async fn test_plain_completion() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "Generative AI"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("generative models")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let chat = OpenAiChat::new(&config(&mock_server.uri())).unwrap();
    let reply = chat.complete("sys", "Generative AI").await.unwrap();

    assert_eq!(reply, "generative models");
    assert_eq!(chat.usage().total_tokens, 15);
}

#[tokio::test]
async fn test_structured_completion_sends_schema() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": {
                "type": "json_schema",
                "json_schema": {"name": "paper_selection", "strict": true}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(r#"{"papers": []}"#)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let chat = OpenAiChat::new(&config(&mock_server.uri())).unwrap();
    let reply = chat
        .complete_structured("sys", "user", &response_schema())
        .await
        .unwrap();
    assert_eq!(reply, r#"{"papers": []}"#);
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&mock_server)
        .await;

    let chat = OpenAiChat::new(&config(&mock_server.uri())).unwrap();
    match chat.complete("sys", "user").await {
        Err(ScoutError::Api { code, .. }) => assert_eq!(code, 401),
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_choices_and_refusals_are_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": null, "refusal": "I can't help with that"}}]
        })))
        .mount(&mock_server)
        .await;

    let chat = OpenAiChat::new(&config(&mock_server.uri())).unwrap();
    assert!(matches!(
        chat.complete("sys", "user").await,
        Err(ScoutError::MalformedModelOutput(_))
    ));
    assert!(matches!(
        chat.complete("sys", "user").await,
        Err(ScoutError::MalformedModelOutput(_))
    ));
}
