//! Selector: ranks retrieved candidates by relevance using a language model.
//!
//! The model sees every eligible candidate and returns a schema-constrained top-K
//! list. Its ranking is trusted as-is, but its content is not: each returned item
//! is matched back to a candidate and the candidate's own fields are kept.

use crate::config::SelectorConfig;
use crate::error::{Result, ScoutError};
use crate::llm::{extract_json, LanguageModel};
use crate::paper::{Paper, PaperSelection, YearRange};
use crate::prompts::paper_selection::{build_user_prompt, response_schema, SYSTEM_PROMPT};
use crate::retriever::Retriever;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One entry of the model's structured answer
#[derive(Debug, Clone, Deserialize)]
pub struct SelectedItem {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub url: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct SelectionOutput {
    papers: Vec<SelectedItem>,
}

pub struct Selector {
    retriever: Retriever,
    llm: Arc<dyn LanguageModel>,
    config: SelectorConfig,
    fetch_limit: u32,
    year_range: YearRange,
}

impl Selector {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LanguageModel>,
        config: SelectorConfig,
        fetch_limit: u32,
        year_range: YearRange,
    ) -> Self {
        Self {
            retriever,
            llm,
            config,
            fetch_limit,
            year_range,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Retrieve candidates for `request` and ask the model for the top-K.
    ///
    /// `memory` holds URLs surfaced in earlier runs; those papers are skipped.
    /// Returns `Ok(None)` when no eligible candidate is left or the model
    /// selected none of them.
    pub async fn scan(&self, memory: &[String], request: &str) -> Result<Option<PaperSelection>> {
        let query = self.retriever.generate_query(request).await?;
        let fetched = self
            .retriever
            .fetch(&query, 0, self.fetch_limit, &self.year_range)
            .await;
        let fetched_count = fetched.len();

        let candidates = eligible_candidates(fetched, memory);
        info!(
            fetched = fetched_count,
            eligible = candidates.len(),
            "Candidates ready for selection"
        );

        if candidates.is_empty() {
            return Ok(None);
        }

        let k = self.config.top_k.min(candidates.len());
        let descriptions: Vec<String> = candidates.iter().map(Paper::describe).collect();
        let user_prompt = build_user_prompt(request.trim(), &descriptions, k);

        debug!(k = k, "Calling model with structured output");
        let content = self
            .llm
            .complete_structured(SYSTEM_PROMPT, &user_prompt, &response_schema())
            .await?;

        let items = parse_selection(&content)?;
        let papers = reconcile(items, &candidates, k, self.config.strict_echo)?;
        if papers.is_empty() {
            warn!(eligible = candidates.len(), "Model selected none of the candidates");
            return Ok(None);
        }

        info!(selected = papers.len(), "Selection complete");
        Ok(Some(PaperSelection { papers }))
    }
}

/// Keep rankable papers not already surfaced, one per URL.
pub fn eligible_candidates(papers: Vec<Paper>, memory: &[String]) -> Vec<Paper> {
    let mut seen: HashSet<String> = memory.iter().map(|u| normalize(u)).collect();

    papers
        .into_iter()
        .filter(Paper::is_rankable)
        .filter(|p| {
            let url = normalize(&p.url);
            url.is_empty() || seen.insert(url)
        })
        .collect()
}

/// Decode the model's JSON answer and check score bounds.
pub fn parse_selection(content: &str) -> Result<Vec<SelectedItem>> {
    let json_str = extract_json(content);
    let output: SelectionOutput = serde_json::from_str(&json_str).map_err(|e| {
        let preview: String = content.chars().take(200).collect();
        ScoutError::MalformedModelOutput(format!("{} (content: {})", e, preview))
    })?;

    for item in &output.papers {
        if !item.score.is_finite() || !(0.0..=1.0).contains(&item.score) {
            return Err(ScoutError::MalformedModelOutput(format!(
                "score {} for '{}' is outside [0, 1]",
                item.score, item.title
            )));
        }
    }

    Ok(output.papers)
}

/// Map model items back onto candidates, in model order, capped at `k`.
pub fn reconcile(
    items: Vec<SelectedItem>,
    candidates: &[Paper],
    k: usize,
    strict: bool,
) -> Result<Vec<Paper>> {
    let by_url: HashMap<String, usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.url.trim().is_empty())
        .map(|(i, p)| (normalize(&p.url), i))
        .collect();
    let by_title: HashMap<String, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, p)| (normalize(&p.title).to_lowercase(), i))
        .collect();

    let returned = items.len();
    let mut used = HashSet::new();
    let mut selected = Vec::with_capacity(k);

    for item in items {
        let url = normalize(&item.url);
        let idx = match by_url.get(&url) {
            Some(idx) => Some(*idx),
            // strict mode only falls back to the title when the model gave no URL
            None if strict && !url.is_empty() => {
                return Err(ScoutError::Hallucinated(item.url));
            }
            None => by_title.get(&normalize(&item.title).to_lowercase()).copied(),
        };

        let Some(idx) = idx else {
            if strict {
                return Err(ScoutError::Hallucinated(item.url));
            }
            warn!(url = %item.url, title = %item.title, "Dropping paper not among candidates");
            continue;
        };

        let candidate = &candidates[idx];
        if strict
            && (normalize(&item.title) != normalize(&candidate.title)
                || normalize(&item.abstract_text) != normalize(&candidate.abstract_text))
        {
            return Err(ScoutError::Hallucinated(format!(
                "content for {} differs from the candidate",
                candidate.url
            )));
        }

        if !used.insert(idx) {
            debug!(url = %candidate.url, "Skipping duplicate selection");
            continue;
        }

        if selected.len() == k {
            warn!(returned = returned, k = k, "Model returned more papers than requested");
            break;
        }

        let mut paper = candidate.clone();
        paper.relevance_score = Some(item.score);
        selected.push(paper);
    }

    if selected.len() < k {
        warn!(
            selected = selected.len(),
            k = k,
            "Model returned fewer papers than requested"
        );
    }

    Ok(selected)
}

/// Collapse whitespace runs so light reformatting still matches.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
