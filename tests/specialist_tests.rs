//! Mock-based tests for the specialist model client
#![allow(clippy::unwrap_used)]

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paperscout::estimator::specialist::SpecialistModel;
use paperscout::estimator::InfluenceModel;
use paperscout::{Paper, ScoutError};

fn sample() -> Paper {
    Paper {
        title: "Sparse Mixtures".to_string(),
        abstract_text: "We route tokens to experts.".to_string(),
        url: "https://example.org/moe".to_string(),
        observed_citation_count: Some(2),
        published: Some("2024-03-01".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_specialist_sends_model_input() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({
            "input": "Year: 2024\nAbstract: We route tokens to experts.\nNumber of citations: "
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(17.5)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let model = SpecialistModel::new(&format!("{}/predict", mock_server.uri())).unwrap();
    let estimate = model.estimate(&sample().describe()).await.unwrap();
    assert_eq!(estimate, 17.5);
}

#[tokio::test]
async fn test_specialist_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("loading"))
        .mount(&mock_server)
        .await;

    let model = SpecialistModel::new(&mock_server.uri()).unwrap();
    assert!(matches!(
        model.estimate(&sample().describe()).await,
        Err(ScoutError::Api { code: 503, .. })
    ));
}
