//! Tabular regression forest.
//!
//! The forest is trained offline and exported as JSON. Each tree is a flat node
//! list where node 0 is the root:
//!
//! ```json
//! {"trees": [{"nodes": [
//!     {"feature": 2, "threshold": 120.0, "left": 1, "right": 2},
//!     {"value": 4.0},
//!     {"value": 11.0}
//! ]}]}
//! ```
//!
//! Samples go left when `x[feature] <= threshold`. The forest prediction is the
//! mean of the tree outputs.

use super::InfluenceModel;
use crate::error::{Result, ScoutError};
use crate::paper::{extract_year, Paper};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Number of features produced by [`DescriptionFeatures::to_vector`]
pub const FEATURE_COUNT: usize = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        // validate() guarantees indices are in bounds and acyclic
        for _ in 0..=self.nodes.len() {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
        0.0
    }

    /// Check bounds and that every child index points forward.
    fn validate(&self, tree_idx: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ScoutError::Parse(format!("tree {} has no nodes", tree_idx)));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                threshold,
            } = node
            {
                let in_bounds = *left < self.nodes.len() && *right < self.nodes.len();
                if *feature >= FEATURE_COUNT || !in_bounds || *left <= i || *right <= i {
                    return Err(ScoutError::Parse(format!(
                        "tree {} node {} has an invalid split",
                        tree_idx, i
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ScoutError::Parse(format!(
                        "tree {} node {} has a non-finite threshold",
                        tree_idx, i
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Numeric features read back out of a [`crate::paper::Paper::describe`] text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionFeatures {
    pub year: f64,
    pub title_words: f64,
    pub abstract_words: f64,
    pub observed_citations: f64,
    pub mean_word_length: f64,
}

impl DescriptionFeatures {
    pub fn from_description(description: &str) -> Self {
        let paper = Paper::from_description(description);
        let words: Vec<&str> = paper.abstract_text.split_whitespace().collect();
        let mean_word_length = if words.is_empty() {
            0.0
        } else {
            words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64
        };

        Self {
            year: paper
                .published
                .as_deref()
                .and_then(extract_year)
                .map_or(0.0, f64::from),
            title_words: paper.title.split_whitespace().count() as f64,
            abstract_words: words.len() as f64,
            observed_citations: paper.observed_citation_count.unwrap_or_default() as f64,
            mean_word_length,
        }
    }

    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.year,
            self.title_words,
            self.abstract_words,
            self.observed_citations,
            self.mean_word_length,
        ]
    }
}

/// On-disk shape; only reachable through [`RandomForestModel::load`]
#[derive(Deserialize)]
struct ForestArtifact {
    trees: Vec<Tree>,
}

/// A validated forest. Construct with [`RandomForestModel::load`] or
/// [`RandomForestModel::from_trees`].
#[derive(Debug, Clone)]
pub struct RandomForestModel {
    trees: Vec<Tree>,
}

impl RandomForestModel {
    pub fn from_trees(trees: Vec<Tree>) -> Result<Self> {
        if trees.is_empty() {
            return Err(ScoutError::Parse("forest has no trees".to_string()));
        }
        for (i, tree) in trees.iter().enumerate() {
            tree.validate(i)?;
        }
        Ok(Self { trees })
    }

    /// Load a forest from its JSON artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: ForestArtifact = serde_json::from_str(&content)
            .map_err(|e| ScoutError::Parse(format!("invalid forest artifact {:?}: {}", path, e)))?;
        let forest = Self::from_trees(raw.trees)?;
        info!(path = ?path, trees = forest.trees.len(), "Loaded random forest");
        Ok(forest)
    }

    pub fn predict(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        self.trees.iter().map(|t| t.predict(x)).sum::<f64>() / self.trees.len() as f64
    }
}

#[async_trait]
impl InfluenceModel for RandomForestModel {
    fn name(&self) -> &str {
        "random_forest"
    }

    async fn estimate(&self, description: &str) -> Result<f64> {
        let features = DescriptionFeatures::from_description(description);
        Ok(self.predict(&features.to_vector()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FOREST: &str = r#"{"trees": [
        {"nodes": [
            {"feature": 3, "threshold": 10.0, "left": 1, "right": 2},
            {"value": 2.0},
            {"value": 20.0}
        ]},
        {"nodes": [{"value": 6.0}]}
    ]}"#;

    #[test]
    fn test_features_from_description() {
        let paper = Paper {
            title: "Attention Is All You Need".to_string(),
            abstract_text: "We propose the Transformer".to_string(),
            url: "https://example.org".to_string(),
            observed_citation_count: Some(15),
            published: Some("2017".to_string()),
            ..Default::default()
        };
        let features = DescriptionFeatures::from_description(&paper.describe());
        assert_eq!(features.year, 2017.0);
        assert_eq!(features.title_words, 5.0);
        assert_eq!(features.abstract_words, 4.0);
        assert_eq!(features.observed_citations, 15.0);
        assert_eq!(features.mean_word_length, 23.0 / 4.0);
    }

    #[test]
    fn test_unknown_fields_default_to_zero() {
        let features = DescriptionFeatures::from_description("Citations: N/A\nPublished: N/A\n");
        assert_eq!(features, DescriptionFeatures::default());
    }

    #[tokio::test]
    async fn test_forest_averages_trees() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FOREST.as_bytes()).unwrap();
        let forest = RandomForestModel::load(file.path()).unwrap();

        assert_eq!(forest.predict(&[0.0, 0.0, 0.0, 5.0, 0.0]), 4.0);
        assert_eq!(forest.predict(&[0.0, 0.0, 0.0, 50.0, 0.0]), 13.0);
        assert_eq!(forest.estimate("Citations: 11\n").await.unwrap(), 13.0);
    }

    #[test]
    fn test_load_validates_artifact() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"trees": [{"nodes": [{"feature": 0, "threshold": 1.0, "left": 5, "right": 6}]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            RandomForestModel::load(file.path()),
            Err(ScoutError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_bad_trees() {
        let cyclic: Vec<Tree> = serde_json::from_str(
            r#"[{"nodes": [{"feature": 0, "threshold": 1.0, "left": 0, "right": 1}, {"value": 1.0}]}]"#,
        )
        .unwrap();
        assert!(RandomForestModel::from_trees(cyclic).is_err());

        let bad_feature: Vec<Tree> = serde_json::from_str(
            r#"[{"nodes": [{"feature": 9, "threshold": 1.0, "left": 1, "right": 1}, {"value": 1.0}]}]"#,
        )
        .unwrap();
        assert!(RandomForestModel::from_trees(bad_feature).is_err());

        assert!(RandomForestModel::from_trees(Vec::new()).is_err());
    }
}
