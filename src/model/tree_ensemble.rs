//! Gradient-boosted regression tree ensemble
//!
//! JSON artifact exported from the training pipeline and loaded once at
//! startup. Prediction = `base_score + Σ leaf value of each tree`.
//!
//! Split rules:
//! - numeric: `value <= threshold` goes left
//! - categorical: value in `left_categories` goes left, anything else
//!   (including categories never seen in training) goes right
//!
//! Nodes are stored flat per tree with node 0 as the root. Children must sit at
//! a higher index than their parent, which makes every walk terminate.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use thiserror::Error;

use super::{InferenceError, YieldModel};
use crate::features::{Feature, FeatureRow, FEATURE_COLUMNS};

/// Errors raised while loading a model artifact
#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model: tree {tree}, node {node}: {reason}")]
    InvalidTree {
        tree: usize,
        node: usize,
        reason: String,
    },

    #[error("invalid model: {0}")]
    Invalid(String),
}

/// One node of a regression tree
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Numeric {
        feature: Feature,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Categorical {
        feature: Feature,
        left_categories: FxHashSet<String>,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree (flat node array, root at 0)
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

/// Additive tree ensemble predicting yield in hg/ha
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Load and validate a model artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let model = Self::from_json_str(&contents)?;
        tracing::info!(
            "Loaded tree ensemble from {:?} ({} trees, {} nodes)",
            path,
            model.trees.len(),
            model.node_count()
        );
        Ok(model)
    }

    /// Parse and validate a model from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ModelLoadError> {
        let model: TreeEnsemble = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(|t| t.nodes.len()).sum()
    }

    /// Structural checks so `predict_row` can walk trees without bounds errors
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if !self.base_score.is_finite() {
            return Err(ModelLoadError::Invalid("base_score must be finite".to_string()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ModelLoadError::InvalidTree {
                    tree: t,
                    node: 0,
                    reason: "tree has no nodes".to_string(),
                });
            }

            let n = tree.nodes.len();
            for (i, node) in tree.nodes.iter().enumerate() {
                let invalid = |reason: String| ModelLoadError::InvalidTree {
                    tree: t,
                    node: i,
                    reason,
                };

                let (left, right) = match node {
                    Node::Leaf { value } => {
                        if !value.is_finite() {
                            return Err(invalid("leaf value must be finite".to_string()));
                        }
                        continue;
                    }
                    Node::Numeric { feature, threshold, left, right } => {
                        if feature.is_categorical() {
                            return Err(invalid(format!(
                                "numeric split on categorical feature '{}'",
                                feature.name()
                            )));
                        }
                        if !threshold.is_finite() {
                            return Err(invalid("threshold must be finite".to_string()));
                        }
                        (*left, *right)
                    }
                    Node::Categorical { feature, left, right, .. } => {
                        if !feature.is_categorical() {
                            return Err(invalid(format!(
                                "categorical split on numeric feature '{}'",
                                feature.name()
                            )));
                        }
                        (*left, *right)
                    }
                };

                for child in [left, right] {
                    if child <= i || child >= n {
                        return Err(invalid(format!(
                            "child index {} out of range ({}..{})",
                            child,
                            i + 1,
                            n
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Predict a single row (`idx` is only used for error reporting)
    fn predict_row(&self, idx: usize, row: &FeatureRow<'_>) -> Result<f64, InferenceError> {
        for feature in FEATURE_COLUMNS {
            if let Some(v) = row.numeric(feature) {
                if !v.is_finite() {
                    return Err(InferenceError::NonFiniteFeature {
                        row: idx,
                        feature: feature.name(),
                    });
                }
            }
        }

        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.leaf_value(row);
        }
        Ok(total)
    }
}

impl Tree {
    fn leaf_value(&self, row: &FeatureRow<'_>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Numeric { feature, threshold, left, right } => {
                    // validated: numeric features only, finite inputs checked upstream
                    let v = row.numeric(*feature).unwrap_or(f64::NAN);
                    idx = if v <= *threshold { *left } else { *right };
                }
                Node::Categorical { feature, left_categories, left, right } => {
                    let goes_left = row
                        .categorical(*feature)
                        .is_some_and(|c| left_categories.contains(c));
                    idx = if goes_left { *left } else { *right };
                }
            }
        }
    }
}

impl YieldModel for TreeEnsemble {
    fn predict(&self, rows: &[FeatureRow<'_>]) -> Result<Vec<f64>, InferenceError> {
        rows.par_iter()
            .enumerate()
            .map(|(i, row)| self.predict_row(i, row))
            .collect()
    }
}
