//! Retrieval-augmented frontier model.
//!
//! Finds the reference papers most similar to the description (token Jaccard over
//! title and abstract), shows them to the LLM with their known citation counts and
//! parses the first number of its reply.

use super::InfluenceModel;
use crate::error::{Result, ScoutError};
use crate::llm::LanguageModel;
use crate::paper::Paper;
use crate::prompts::influence::{build_user_prompt, SYSTEM_PROMPT};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Reference papers shown to the model
const CONTEXT_SIZE: usize = 5;

pub struct FrontierModel {
    llm: Arc<dyn LanguageModel>,
    references: Vec<(HashSet<String>, Paper)>,
    number: Regex,
}

impl FrontierModel {
    pub fn new(llm: Arc<dyn LanguageModel>, references: Vec<Paper>) -> Result<Self> {
        let number = Regex::new(r"[-+]?\d*\.?\d+")
            .map_err(|e| ScoutError::Config(format!("invalid number pattern: {}", e)))?;

        let references = references
            .into_iter()
            .filter(|p| p.observed_citation_count.is_some())
            .map(|p| (tokens(&format!("{} {}", p.title, p.abstract_text)), p))
            .collect();

        Ok(Self {
            llm,
            references,
            number,
        })
    }

    /// Load reference papers from a JSON array of papers.
    pub fn load_references(path: &Path) -> Result<Vec<Paper>> {
        let content = std::fs::read_to_string(path)?;
        let papers: Vec<Paper> = serde_json::from_str(&content)
            .map_err(|e| ScoutError::Parse(format!("invalid reference papers {:?}: {}", path, e)))?;
        info!(path = ?path, count = papers.len(), "Loaded reference papers");
        Ok(papers)
    }

    /// Descriptions of the most similar reference papers, best match first
    fn similar(&self, description: &str) -> Vec<String> {
        let target = tokens(description);
        let mut scored: Vec<(f64, &Paper)> = self
            .references
            .iter()
            .map(|(words, paper)| (jaccard(&target, words), paper))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(CONTEXT_SIZE)
            .map(|(_, paper)| paper.describe())
            .collect()
    }

    fn parse_estimate(&self, reply: &str) -> Option<f64> {
        let cleaned = reply.replace([',', '$'], "");
        self.number
            .find(&cleaned)
            .and_then(|m| m.as_str().parse::<f64>().ok())
    }
}

#[async_trait]
impl InfluenceModel for FrontierModel {
    fn name(&self) -> &str {
        "frontier"
    }

    async fn estimate(&self, description: &str) -> Result<f64> {
        let context = self.similar(description);
        debug!(context = context.len(), "Frontier prompt context");

        let prompt = build_user_prompt(description, &context);
        let reply = self.llm.complete(SYSTEM_PROMPT, &prompt).await?;

        self.parse_estimate(&reply).ok_or_else(|| {
            let preview: String = reply.chars().take(80).collect();
            ScoutError::MalformedModelOutput(format!("no number in frontier reply: {}", preview))
        })
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
