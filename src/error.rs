//! Error taxonomy for the prediction and recommendation engine
//!
//! Client-input errors (bad unit, bad prices, nothing to rank) are kept apart
//! from inference failures so the service layer can map them to 4xx vs 5xx.

use thiserror::Error;

use crate::model::InferenceError;

/// Errors surfaced by the engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Price unit matched none of the recognized families (t, kg, hg)
    #[error("Unsupported price_unit: {unit}")]
    UnsupportedUnit { unit: String },

    /// Revenue ranking found no candidate with a supplied price
    #[error("No candidate items have a provided price. Provide prices like {{\"maize\": 180, ...}}.")]
    NoPricedCandidates,

    /// One or more supplied prices are zero, negative or not a number
    #[error("All prices must be > 0. Invalid items: {items:?}")]
    InvalidPrice { items: Vec<String> },

    /// The model failed during prediction; fatal for the whole request
    #[error("Inference failed: {0}")]
    InferenceFailure(#[from] InferenceError),
}

impl EngineError {
    /// True for errors caused by the caller's input (4xx class)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, EngineError::InferenceFailure(_))
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
