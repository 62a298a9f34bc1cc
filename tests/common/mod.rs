//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use paperscout::config::SearchConfig;
use paperscout::llm::{LanguageModel, ResponseSchema};
use paperscout::retriever::PaperSource;
use paperscout::{Paper, Result, YearRange};

/// Answers plain calls with a fixed query and structured calls with a fixed selection.
pub struct ScriptedModel {
    pub query: String,
    pub selection: String,
    pub structured_prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(query: &str, selection: String) -> Arc<Self> {
        Arc::new(Self {
            query: query.to_string(),
            selection,
            structured_prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Ok(self.query.clone())
    }

    async fn complete_structured(
        &self,
        _system: &str,
        user: &str,
        _schema: &ResponseSchema,
    ) -> Result<String> {
        self.structured_prompts.lock().unwrap().push(user.to_string());
        Ok(self.selection.clone())
    }
}

/// Returns the same papers for every query.
pub struct StaticSource(pub Vec<Paper>);

#[async_trait]
impl PaperSource for StaticSource {
    async fn fetch(&self, _query: &str, _offset: u32, _limit: u32, _years: &YearRange) -> Vec<Paper> {
        self.0.clone()
    }
}

pub fn paper(n: usize, abstract_text: &str, citations: i64) -> Paper {
    Paper {
        title: format!("Paper {}", n),
        abstract_text: abstract_text.to_string(),
        url: format!("https://www.semanticscholar.org/paper/{}", n),
        observed_citation_count: Some(citations),
        published: Some("2024".to_string()),
        ..Default::default()
    }
}

/// Model answer listing `papers` in order with descending scores.
pub fn selection_json(papers: &[Paper]) -> String {
    let items: Vec<_> = papers
        .iter()
        .enumerate()
        .map(|(i, p)| {
            json!({
                "title": p.title,
                "abstract": p.abstract_text,
                "url": p.url,
                "score": 1.0 / (i as f64 + 1.0),
            })
        })
        .collect();
    json!({ "papers": items }).to_string()
}

/// Search API record in the graph API shape
pub fn search_record(id: &str, title: &str, abstract_text: Option<&str>, citations: i64) -> serde_json::Value {
    json!({
        "paperId": id,
        "title": title,
        "year": 2024,
        "url": format!("https://www.semanticscholar.org/paper/{}", id),
        "externalIds": {"ArXiv": "2401.00001"},
        "citationCount": citations,
        "abstract": abstract_text,
        "authors": [{"authorId": "1", "name": "Alice Researcher"}]
    })
}

pub fn search_config(uri: &str) -> SearchConfig {
    SearchConfig {
        graph_api_url: uri.to_string(),
        year_range: YearRange::single(2024),
        rate_limit_backoff: std::time::Duration::from_millis(20),
        ..Default::default()
    }
}
