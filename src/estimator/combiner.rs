//! Linear combiner over the ensemble feature vector.
//!
//! The weights are fitted offline; this module only loads and applies them.
//! Artifact format:
//!
//! ```json
//! {"intercept": 1.2, "coefficients": [0.4, 0.3, 0.2, 0.05, 0.05]}
//! ```

use crate::error::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Coefficients follow the feature order specialist, frontier, random forest, min, max
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearCombiner {
    pub intercept: f64,
    pub coefficients: [f64; 5],
}

impl LinearCombiner {
    pub fn new(intercept: f64, coefficients: [f64; 5]) -> Self {
        Self {
            intercept,
            coefficients,
        }
    }

    /// Load weights from a JSON artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let combiner: Self = serde_json::from_str(&content).map_err(|e| {
            ScoutError::Parse(format!("invalid combiner artifact {:?}: {}", path, e))
        })?;

        if !combiner.intercept.is_finite() || combiner.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ScoutError::Parse(format!(
                "combiner artifact {:?} contains non-finite weights",
                path
            )));
        }

        info!(path = ?path, intercept = combiner.intercept, "Loaded linear combiner");
        Ok(combiner)
    }

    /// Raw linear prediction; the caller applies the zero clamp.
    pub fn predict(&self, features: &[f64; 5]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.iter())
                .map(|(c, x)| c * x)
                .sum::<f64>()
    }
}
