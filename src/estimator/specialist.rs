//! Client for the fine-tuned citation model served over HTTP.
//!
//! Request: `POST {endpoint}` with `{"input": "<model input>"}`, where the model
//! input is the year/abstract prompt the model was fine-tuned on.
//! Response: a bare number or `{"estimate": <number>}`.

use super::InfluenceModel;
use crate::error::{Result, ScoutError};
use crate::paper::Paper;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpecialistResponse {
    Bare(f64),
    Wrapped { estimate: f64 },
}

impl SpecialistResponse {
    fn value(&self) -> f64 {
        match self {
            Self::Bare(v) | Self::Wrapped { estimate: v } => *v,
        }
    }
}

pub struct SpecialistModel {
    client: reqwest::Client,
    endpoint: String,
}

impl SpecialistModel {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ScoutError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl InfluenceModel for SpecialistModel {
    fn name(&self) -> &str {
        "specialist"
    }

    async fn estimate(&self, description: &str) -> Result<f64> {
        let input = Paper::from_description(description).model_input();
        debug!(endpoint = %self.endpoint, "Querying specialist model");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "input": input }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScoutError::Api {
                code: status.as_u16() as i32,
                message: format!("Specialist model error: {} - {}", status, error_text),
            });
        }

        let body: SpecialistResponse = response
            .json()
            .await
            .map_err(|e| ScoutError::Parse(format!("Failed to parse specialist response: {}", e)))?;

        Ok(body.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shapes() {
        let bare: SpecialistResponse = serde_json::from_str("12.5").unwrap();
        assert_eq!(bare.value(), 12.5);
        let wrapped: SpecialistResponse = serde_json::from_str(r#"{"estimate": 3}"#).unwrap();
        assert_eq!(wrapped.value(), 3.0);
        assert!(serde_json::from_str::<SpecialistResponse>(r#"{"price": 3}"#).is_err());
    }
}
