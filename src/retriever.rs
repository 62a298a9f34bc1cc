//! Retriever: request → search query → candidate papers.

use crate::error::{Result, ScoutError};
use crate::llm::LanguageModel;
use crate::paper::{Paper, YearRange};
use crate::prompts::search_query::SYSTEM_PROMPT;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// A bibliographic search backend.
///
/// Implementations swallow request failures: they log the cause and return an
/// empty batch.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Fetch page `start_offset` (zero-based, `limit` papers per page).
    async fn fetch(
        &self,
        query: &str,
        start_offset: u32,
        limit: u32,
        year_range: &YearRange,
    ) -> Vec<Paper>;
}

pub struct Retriever {
    llm: Arc<dyn LanguageModel>,
    source: Arc<dyn PaperSource>,
}

impl Retriever {
    pub fn new(llm: Arc<dyn LanguageModel>, source: Arc<dyn PaperSource>) -> Self {
        Self { llm, source }
    }

    /// Compress a free-form request into a short keyword query.
    pub async fn generate_query(&self, request: &str) -> Result<String> {
        let request = request.trim();
        if request.is_empty() {
            return Err(ScoutError::Validation("research request is empty".to_string()));
        }

        let raw = self.llm.complete(SYSTEM_PROMPT, request).await?;
        let query = clean_query(&raw);
        if query.is_empty() {
            return Err(ScoutError::EmptyQuery);
        }

        info!(query = %query, "Generated search query");
        Ok(query)
    }

    pub async fn fetch(
        &self,
        query: &str,
        start_offset: u32,
        limit: u32,
        year_range: &YearRange,
    ) -> Vec<Paper> {
        debug!(query = query, year = %year_range, "Fetching candidates");
        self.source.fetch(query, start_offset, limit, year_range).await
    }
}

/// Trim whitespace and any wrapping quotes the model added.
fn clean_query(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}
