//! Pipeline configuration.
//!
//! Every collaborator receives its section of [`Config`] through its constructor.
//! Only the binary touches the process environment when assembling it.

use crate::error::{Result, ScoutError};
use crate::paper::YearRange;
use std::path::PathBuf;
use std::time::Duration;

/// Semantic Scholar graph API base URL
pub const DEFAULT_GRAPH_API: &str = "https://api.semanticscholar.org/graph/v1";

/// Default OpenAI-compatible API base URL
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Top-level configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub selector: SelectorConfig,
    pub estimator: EstimatorConfig,
    pub planner: PlannerConfig,
    pub notifier: NotifierConfig,
}

impl Config {
    /// Check cross-field constraints before any client is built.
    pub fn validate(&self) -> Result<()> {
        self.llm.validate()?;
        self.search.validate()?;
        self.selector.validate()?;
        self.planner.validate()?;
        Ok(())
    }
}

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: 0.1,
            timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    pub fn validate(&self) -> Result<()> {
        check_url("llm base url", &self.base_url)?;
        if self.api_key.trim().is_empty() {
            return Err(ScoutError::Config("LLM API key is not set".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ScoutError::Config("LLM model name is empty".to_string()));
        }
        Ok(())
    }
}

/// Search service configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub graph_api_url: String,
    pub api_key: Option<String>,
    /// Papers requested per scan
    pub fetch_limit: u32,
    pub year_range: YearRange,
    pub timeout: Duration,
    /// Fixed wait before the single retry on HTTP 429
    pub rate_limit_backoff: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            graph_api_url: DEFAULT_GRAPH_API.to_string(),
            api_key: None,
            fetch_limit: 50,
            year_range: YearRange::current_year(),
            timeout: Duration::from_secs(20),
            rate_limit_backoff: Duration::from_secs(30),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        check_url("graph api url", &self.graph_api_url)?;
        if self.fetch_limit == 0 || self.fetch_limit > 1000 {
            return Err(ScoutError::Config(format!(
                "fetch limit must be within 1..=1000, got {}",
                self.fetch_limit
            )));
        }
        Ok(())
    }
}

/// Selector configuration
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Maximum number of papers the model is asked to return
    pub top_k: usize,
    /// Reject model output that does not echo the candidates exactly
    pub strict_echo: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            top_k: 20,
            strict_echo: false,
        }
    }
}

impl SelectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(ScoutError::Config("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Ensemble collaborator locations
#[derive(Debug, Clone, Default)]
pub struct EstimatorConfig {
    /// Endpoint of the fine-tuned specialist model
    pub specialist_url: Option<String>,
    /// JSON array of reference papers for the frontier model
    pub reference_papers: Option<PathBuf>,
    /// JSON random forest artifact
    pub forest_path: Option<PathBuf>,
    /// JSON linear combiner artifact
    pub combiner_path: Option<PathBuf>,
}

impl EstimatorConfig {
    pub fn is_configured(&self) -> bool {
        self.specialist_url.is_some() && self.forest_path.is_some() && self.combiner_path.is_some()
    }
}

/// Planner configuration
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Number of papers surfaced per run
    pub top_n: usize,
    /// Parallel estimator calls (1 = sequential)
    pub estimate_concurrency: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            estimate_concurrency: 1,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(ScoutError::Config("top_n must be at least 1".to_string()));
        }
        if self.estimate_concurrency == 0 {
            return Err(ScoutError::Config(
                "estimate concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Notification sink configuration
#[derive(Debug, Clone, Default)]
pub struct NotifierConfig {
    /// Webhook receiving the surfaced papers; log-only when absent
    pub webhook_url: Option<String>,
}

fn check_url(name: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ScoutError::Config(format!("invalid {} '{}': {}", name, value, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ScoutError::Config(format!(
            "{} must use http or https, got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.llm.api_key = "sk-test".to_string();
        config
    }

    #[test]
    fn test_defaults_validate() {
        assert!(valid().validate().is_ok());
        assert_eq!(valid().selector.top_k, 20);
        assert_eq!(valid().planner.top_n, 5);
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ScoutError::Config(_))));
    }

    #[test]
    fn test_bad_urls_rejected() {
        let mut config = valid();
        config.search.graph_api_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.llm.base_url = "ftp://llm.local".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = valid();
        config.selector.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.planner.estimate_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.search.fetch_limit = 0;
        assert!(config.validate().is_err());
    }
}
