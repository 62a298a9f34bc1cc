//! Notification sinks for surfaced papers.
//!
//! Alerts are fire-and-forget: delivery problems are logged and never reach the
//! pipeline.

use crate::error::{Result, ScoutError};
use crate::paper::Paper;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn alert(&self, papers: &[Paper]);
}

/// Emits one tracing event per paper
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn alert(&self, papers: &[Paper]) {
        for (rank, paper) in papers.iter().enumerate() {
            info!(
                rank = rank + 1,
                title = %paper.title,
                url = %paper.url,
                influence = paper.predicted_influence_score.unwrap_or_default(),
                "Surfaced paper"
            );
        }
    }
}

/// Posts `{"text": ...}` to a webhook (Slack-compatible payload)
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ScoutError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    async fn post(&self, text: String) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::Api {
                code: status.as_u16() as i32,
                message: format!("Webhook rejected alert: {}", status),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn alert(&self, papers: &[Paper]) {
        if papers.is_empty() {
            return;
        }
        match self.post(format_alert(papers)).await {
            Ok(()) => info!(count = papers.len(), "Webhook alert delivered"),
            Err(e) => warn!(error = %e, "Webhook alert failed"),
        }
    }
}

/// Human-readable alert body
pub fn format_alert(papers: &[Paper]) -> String {
    let mut text = String::from("Most influential new papers:\n");
    for (rank, paper) in papers.iter().enumerate() {
        let score = paper
            .predicted_influence_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "n/a".to_string());
        text.push_str(&format!(
            "{}. {} (influence {})\n   {}\n",
            rank + 1,
            paper.title,
            score,
            paper.url
        ));
    }
    text
}
