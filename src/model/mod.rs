//! Inference capability
//!
//! The engine treats the regression model as a black box: N feature rows in,
//! N yields (hg/ha) out. Any implementation of `YieldModel` is substitutable.
//!
//! Implementations must be safe to call from many requests at once (`Sync`);
//! the model is loaded once at startup and never mutated afterwards.

pub mod tree_ensemble;

pub use tree_ensemble::{ModelLoadError, TreeEnsemble};

use std::sync::Arc;

use thiserror::Error;

use crate::features::FeatureRow;

/// Failure raised by a model during prediction
#[derive(Debug, Error)]
pub enum InferenceError {
    /// A numeric input was NaN or infinite
    #[error("non-finite value for feature '{feature}' in row {row}")]
    NonFiniteFeature { row: usize, feature: &'static str },

    /// Model returned a different number of predictions than rows
    #[error("model returned {got} predictions for {expected} rows")]
    OutputLength { expected: usize, got: usize },

    /// Any other backend failure (resource exhaustion, corrupt state, ...)
    #[error("{0}")]
    Backend(String),
}

/// Batch regression model: features -> yield in hg/ha
pub trait YieldModel: Send + Sync {
    /// Predict one value per row, aligned by position
    fn predict(&self, rows: &[FeatureRow<'_>]) -> Result<Vec<f64>, InferenceError>;
}

impl<M: YieldModel + ?Sized> YieldModel for Arc<M> {
    fn predict(&self, rows: &[FeatureRow<'_>]) -> Result<Vec<f64>, InferenceError> {
        (**self).predict(rows)
    }
}

impl<M: YieldModel + ?Sized> YieldModel for &M {
    fn predict(&self, rows: &[FeatureRow<'_>]) -> Result<Vec<f64>, InferenceError> {
        (**self).predict(rows)
    }
}

/// Single inference call with output alignment check
pub(crate) fn infer(
    model: &dyn YieldModel,
    rows: &[FeatureRow<'_>],
) -> Result<Vec<f64>, InferenceError> {
    let preds = model.predict(rows)?;
    if preds.len() != rows.len() {
        return Err(InferenceError::OutputLength {
            expected: rows.len(),
            got: preds.len(),
        });
    }
    Ok(preds)
}
