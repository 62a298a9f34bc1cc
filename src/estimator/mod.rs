//! Ensemble influence estimator.
//!
//! Three independent collaborators score the same paper description. Their
//! outputs plus the min and max form a 5-feature vector that a pre-trained
//! linear combiner turns into the final estimate, clamped at zero.
//!
//! ## Collaborators
//!
//! - [`specialist::SpecialistModel`] - fine-tuned model served over HTTP
//! - [`frontier::FrontierModel`] - LLM prompted with similar reference papers
//! - [`forest::RandomForestModel`] - regression forest over description features

pub mod combiner;
pub mod forest;
pub mod frontier;
pub mod specialist;

use crate::config::EstimatorConfig;
use crate::error::{Result, ScoutError};
use crate::llm::LanguageModel;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

pub use combiner::LinearCombiner;

/// A model that scores a paper description
#[async_trait]
pub trait InfluenceModel: Send + Sync {
    /// Short identifier used in logs and errors
    fn name(&self) -> &str;

    /// Non-negative influence estimate for `description`
    async fn estimate(&self, description: &str) -> Result<f64>;
}

/// Outputs of the three collaborators for one description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBundle {
    pub specialist: f64,
    pub frontier: f64,
    pub random_forest: f64,
}

impl ScoreBundle {
    pub fn min(&self) -> f64 {
        self.specialist.min(self.frontier).min(self.random_forest)
    }

    pub fn max(&self) -> f64 {
        self.specialist.max(self.frontier).max(self.random_forest)
    }

    /// `[specialist, frontier, random_forest, min, max]`
    pub fn features(&self) -> [f64; 5] {
        [
            self.specialist,
            self.frontier,
            self.random_forest,
            self.min(),
            self.max(),
        ]
    }
}

pub struct Estimator {
    specialist: Arc<dyn InfluenceModel>,
    frontier: Arc<dyn InfluenceModel>,
    random_forest: Arc<dyn InfluenceModel>,
    combiner: LinearCombiner,
}

impl Estimator {
    pub fn new(
        specialist: Arc<dyn InfluenceModel>,
        frontier: Arc<dyn InfluenceModel>,
        random_forest: Arc<dyn InfluenceModel>,
        combiner: LinearCombiner,
    ) -> Self {
        Self {
            specialist,
            frontier,
            random_forest,
            combiner,
        }
    }

    /// Build the production ensemble from configured artifacts and endpoints.
    pub fn from_config(config: &EstimatorConfig, llm: Arc<dyn LanguageModel>) -> Result<Self> {
        let (Some(specialist_url), Some(forest_path), Some(combiner_path)) = (
            config.specialist_url.as_deref(),
            config.forest_path.as_deref(),
            config.combiner_path.as_deref(),
        ) else {
            return Err(ScoutError::Config(
                "estimator needs a specialist url, a forest artifact and a combiner artifact"
                    .to_string(),
            ));
        };

        let references = match config.reference_papers.as_deref() {
            Some(path) => frontier::FrontierModel::load_references(path)?,
            None => Vec::new(),
        };

        Ok(Self::new(
            Arc::new(specialist::SpecialistModel::new(specialist_url)?),
            Arc::new(frontier::FrontierModel::new(llm, references)?),
            Arc::new(forest::RandomForestModel::load(forest_path)?),
            LinearCombiner::load(combiner_path)?,
        ))
    }

    /// Ask every collaborator for its estimate.
    ///
    /// Any failure aborts the bundle; a missing score is never replaced by zero.
    pub async fn score_bundle(&self, description: &str) -> Result<ScoreBundle> {
        Ok(ScoreBundle {
            specialist: ask(self.specialist.as_ref(), description).await?,
            frontier: ask(self.frontier.as_ref(), description).await?,
            random_forest: ask(self.random_forest.as_ref(), description).await?,
        })
    }

    /// Combined influence estimate for one paper description.
    pub async fn evaluate(&self, description: &str) -> Result<f64> {
        let bundle = self.score_bundle(description).await?;
        let predicted = self.combiner.predict(&bundle.features());
        let estimate = predicted.max(0.0);

        info!(
            specialist = bundle.specialist,
            frontier = bundle.frontier,
            random_forest = bundle.random_forest,
            estimate = estimate,
            "Ensemble estimate complete"
        );
        Ok(estimate)
    }
}

async fn ask(model: &dyn InfluenceModel, description: &str) -> Result<f64> {
    let value = model.estimate(description).await.map_err(|e| match e {
        ScoutError::CollaboratorUnavailable { .. } => e,
        other => ScoutError::collaborator(model.name(), other),
    })?;

    if !value.is_finite() {
        return Err(ScoutError::collaborator(
            model.name(),
            format!("non-finite estimate {}", value),
        ));
    }

    debug!(model = model.name(), value = value, "Collaborator estimate");
    Ok(value.max(0.0))
}
