//! Semantic Scholar API Client
//!
//! Provides keyword search over the graph API to collect candidate papers.
//!
//! API Details:
//! - Search endpoint: GET /graph/v1/paper/search
//! - `bulk=true` with `sort=publicationDate:desc` returns newest papers first
//! - Rate limit: 1 req/s (unauthenticated), higher with API key
//!
//! A 429 response is retried exactly once after a fixed backoff. Every other
//! failure is logged and turned into an empty batch.

use crate::config::SearchConfig;
use crate::error::{Result, ScoutError};
use crate::paper::{Paper, YearRange};
use crate::retriever::PaperSource;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fields requested for every search record
pub const SEARCH_FIELDS: &str = "title,year,url,externalIds,citationCount,abstract,authors";

/// Search client for the Semantic Scholar graph API
pub struct SemanticScholarClient {
    client: Client,
    graph_api_url: String,
    api_key: Option<String>,
    rate_limit_backoff: Duration,
}

#[derive(Debug, Deserialize)]
struct SSSearchResponse {
    #[serde(default)]
    data: Option<Vec<SSPaper>>,
}

#[derive(Debug, Deserialize)]
struct SSPaper {
    #[serde(rename = "paperId")]
    paper_id: Option<String>,
    title: Option<String>,
    year: Option<i32>,
    url: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "citationCount")]
    citation_count: Option<i64>,
    #[serde(rename = "externalIds")]
    external_ids: Option<SSExternalIds>,
    authors: Option<Vec<SSAuthor>>,
}

#[derive(Debug, Deserialize)]
struct SSExternalIds {
    #[serde(rename = "ArXiv")]
    arxiv: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SSAuthor {
    name: Option<String>,
}

impl From<SSPaper> for Paper {
    fn from(p: SSPaper) -> Self {
        let paper_id = p
            .paper_id
            .filter(|id| !id.is_empty())
            .or_else(|| p.external_ids.and_then(|ids| ids.arxiv));

        Paper {
            title: p.title.unwrap_or_default(),
            abstract_text: p.abstract_text.unwrap_or_default(),
            url: p.url.unwrap_or_default(),
            observed_citation_count: p.citation_count,
            authors: p
                .authors
                .unwrap_or_default()
                .into_iter()
                .filter_map(|a| a.name)
                .collect(),
            published: p.year.map(|y| y.to_string()),
            paper_id,
            ..Default::default()
        }
    }
}

impl SemanticScholarClient {
    /// Create a new client from the search section of the config
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("paperscout/0.1")
            .build()
            .map_err(|e| ScoutError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            graph_api_url: config.graph_api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            rate_limit_backoff: config.rate_limit_backoff,
        })
    }

    /// Query parameters for one search page
    fn search_params(
        query: &str,
        start_offset: u32,
        limit: u32,
        year_range: &YearRange,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", query.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
            ("offset", (u64::from(start_offset) * u64::from(limit)).to_string()),
            ("limit", limit.to_string()),
            ("bulk", "true".to_string()),
            ("sort", "publicationDate:desc".to_string()),
        ];
        if !year_range.is_unbounded() {
            params.push(("year", year_range.to_string()));
        }
        params
    }

    async fn send(&self, params: &[(&'static str, String)]) -> Result<reqwest::Response> {
        let url = format!("{}/paper/search", self.graph_api_url);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(params);

        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        Ok(request.send().await?)
    }

    /// Fetch one page of search results, surfacing failures as errors
    pub async fn try_fetch(
        &self,
        query: &str,
        start_offset: u32,
        limit: u32,
        year_range: &YearRange,
    ) -> Result<Vec<Paper>> {
        let params = Self::search_params(query, start_offset, limit, year_range);
        debug!(query = query, offset = start_offset, limit = limit, "Sending search request");

        let mut response = self.send(&params).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(
                backoff_secs = self.rate_limit_backoff.as_secs_f64(),
                "Rate limited, retrying once"
            );
            tokio::time::sleep(self.rate_limit_backoff).await;
            response = self.send(&params).await?;
        }

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScoutError::RateLimited(self.rate_limit_backoff.as_secs()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ScoutError::Api {
                code: status.as_u16() as i32,
                message: format!("Semantic Scholar API error: {} - {}", status, error_text),
            });
        }

        let body: SSSearchResponse = response.json().await.map_err(|e| {
            ScoutError::Parse(format!("Failed to parse Semantic Scholar response: {}", e))
        })?;

        Ok(body
            .data
            .unwrap_or_default()
            .into_iter()
            .map(Paper::from)
            .collect())
    }
}

#[async_trait]
impl PaperSource for SemanticScholarClient {
    async fn fetch(
        &self,
        query: &str,
        start_offset: u32,
        limit: u32,
        year_range: &YearRange,
    ) -> Vec<Paper> {
        match self.try_fetch(query, start_offset, limit, year_range).await {
            Ok(papers) => {
                info!(query = query, count = papers.len(), "Search complete");
                papers
            }
            Err(e) => {
                warn!(query = query, error = %e, "Search failed, returning no papers");
                Vec::new()
            }
        }
    }
}
