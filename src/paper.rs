//! Paper data model shared by every pipeline stage.
//!
//! A [`Paper`] is created by the retriever from raw search records. The selector
//! writes `relevance_score`, the planner writes `predicted_influence_score`; the
//! citation count as scraped stays in `observed_citation_count` untouched.

use crate::error::{Result, ScoutError};
use chrono::Datelike;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// A retrieved academic work
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    #[serde(default)]
    pub abstract_text: String,
    pub url: String,
    /// Citation count reported by the search service (`None` when unknown)
    #[serde(default)]
    pub observed_citation_count: Option<i64>,
    /// Influence estimate produced by the ensemble
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_influence_score: Option<f64>,
    /// Relevance in [0, 1] assigned by the selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub paper_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl Paper {
    /// Only papers with a non-blank abstract can be ranked.
    pub fn is_rankable(&self) -> bool {
        !self.abstract_text.trim().is_empty()
    }

    /// Multi-line description used in prompts and fed to the estimator.
    pub fn describe(&self) -> String {
        let citations = self
            .observed_citation_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "Title: {}\nCitations: {}\nAbstract: {}\nPublished: {}\npaper ID: {} {}\nURL: {}\n",
            self.title,
            citations,
            self.abstract_text,
            self.published.as_deref().unwrap_or("N/A"),
            self.paper_id.as_deref().unwrap_or("N/A"),
            self.version.as_deref().unwrap_or(""),
            self.url,
        )
    }

    /// Parse a [`Paper::describe`] rendering back into a paper.
    ///
    /// Only the rendered fields are recovered; `N/A` and missing lines stay empty.
    pub fn from_description(description: &str) -> Self {
        let known = |value: &str| (!value.is_empty() && value != "N/A").then(|| value.to_string());

        // the abstract may span lines, so take everything up to the next field
        let abstract_text = description
            .split_once("Abstract:")
            .map(|(_, rest)| rest.split("\nPublished:").next().unwrap_or(rest).trim())
            .unwrap_or_default();

        Paper {
            title: description_field(description, "Title:").to_string(),
            abstract_text: abstract_text.to_string(),
            url: description_field(description, "URL:").to_string(),
            observed_citation_count: description_field(description, "Citations:").parse().ok(),
            published: known(description_field(description, "Published:")),
            ..Default::default()
        }
    }

    /// Prompt body for the fine-tuned citation model.
    pub fn model_input(&self) -> String {
        let year = self
            .published
            .as_deref()
            .and_then(extract_year)
            .map(|y| y.to_string())
            .unwrap_or_default();

        format!(
            "Year: {}\nAbstract: {}\nNumber of citations: ",
            year,
            self.abstract_text.trim()
        )
    }
}

/// Value after `name` on the first line starting with it
fn description_field<'a>(description: &'a str, name: &str) -> &'a str {
    description
        .lines()
        .find_map(|line| line.strip_prefix(name))
        .map(str::trim)
        .unwrap_or("")
}

/// Four digits starting with 1 or 2, not part of a longer number
static YEAR_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)([12]\d{3})(?:\D|$)").ok());

/// Pull the first four-digit year (1000-2999) out of a free-form date string.
pub fn extract_year(text: &str) -> Option<i32> {
    let year_regex = YEAR_PATTERN.as_ref()?;
    year_regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Papers chosen by the selector, in the order the model ranked them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperSelection {
    pub papers: Vec<Paper>,
}

impl PaperSelection {
    pub fn len(&self) -> usize {
        self.papers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.papers.is_empty()
    }
}

/// Publication year filter in the search service syntax (`2020-2024`, `2020-`, `-2024`, `2024`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl YearRange {
    pub fn new(start: Option<i32>, end: Option<i32>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(ScoutError::Validation(format!(
                    "year range start {} is after end {}",
                    s, e
                )));
            }
        }
        Ok(Self { start, end })
    }

    /// Range covering only `year`.
    pub fn single(year: i32) -> Self {
        Self {
            start: Some(year),
            end: Some(year),
        }
    }

    /// Range covering the current calendar year.
    pub fn current_year() -> Self {
        Self::single(chrono::Local::now().year())
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{}-{}", s, e),
            (Some(s), None) => write!(f, "{}-", s),
            (None, Some(e)) => write!(f, "-{}", e),
            (None, None) => Ok(()),
        }
    }
}

impl FromStr for YearRange {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parse = |part: &str| -> Result<Option<i32>> {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            part.parse::<i32>()
                .map(Some)
                .map_err(|_| ScoutError::Validation(format!("invalid year: {}", part)))
        };

        match s.split_once('-') {
            Some((start, end)) => YearRange::new(parse(start)?, parse(end)?),
            None => {
                let year = parse(s)?;
                YearRange::new(year, year)
            }
        }
    }
}
