//! Crop Yield Engine
//!
//! Prediction-serving layer around a pre-trained yield regression model.
//! Predicts crop yield (hg/ha) from environmental inputs and ranks candidate
//! crops by predicted yield or by predicted revenue per hectare.
//!
//! Modules:
//! - `units`: price units and yield -> revenue conversion
//! - `scenario`: irrigation / fertilizer additive adjustments
//! - `features`: feature context and fixed-order model rows
//! - `model`: inference trait + gradient-boosted tree ensemble
//! - `predictor`: single-crop point prediction
//! - `ranker`: batch top-K ranking by yield or revenue
//! - `engine`: shared handle bundling model and candidate vocabulary
//! - `api_server`: Axum HTTP facade (feature `api`)

pub mod candidates;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod model;
pub mod predictor;
pub mod ranker;
pub mod scenario;
pub mod units;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use candidates::{CandidateError, CandidateVocabulary};
pub use config::ServerConfig;
pub use engine::YieldEngine;
pub use error::{EngineError, EngineResult};
pub use features::{Feature, FeatureContext, FeatureRow, FEATURE_COLUMNS};
pub use model::{InferenceError, ModelLoadError, TreeEnsemble, YieldModel};
pub use predictor::{predict_point, predict_with_price, PointPrediction, Price};
pub use ranker::{rank_by_revenue, rank_by_yield, PriceTable, RankedRow};
pub use scenario::{adjust, ScenarioFlags, FERTILIZER_BONUS_HG_HA, IRRIGATION_BONUS_HG_HA};
pub use units::{compute_revenue_per_ha, hg_ha_to_t_ha, revenue_per_ha, PriceUnit};

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
