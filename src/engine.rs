//! Yield Engine - shared handle for the prediction and recommendation operations
//!
//! Holds the model (loaded once, read-only) and the candidate vocabulary.
//! The handle is cheap to clone and safe to share across request threads;
//! every operation is a pure function of its inputs plus the model.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::candidates::CandidateVocabulary;
use crate::error::EngineResult;
use crate::features::FeatureContext;
use crate::model::{TreeEnsemble, YieldModel};
use crate::predictor::{predict_with_price, PointPrediction, Price};
use crate::ranker::{rank_by_revenue, rank_by_yield, PriceTable, RankedRow};
use crate::scenario::ScenarioFlags;
use crate::units::PriceUnit;

#[derive(Clone)]
pub struct YieldEngine {
    model: Arc<dyn YieldModel>,
    candidates: Arc<CandidateVocabulary>,
}

impl std::fmt::Debug for YieldEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YieldEngine")
            .field("candidates", &self.candidates.len())
            .finish_non_exhaustive()
    }
}

impl YieldEngine {
    /// Wrap an already-loaded model and vocabulary
    pub fn new(model: Arc<dyn YieldModel>, candidates: CandidateVocabulary) -> Self {
        Self {
            model,
            candidates: Arc::new(candidates),
        }
    }

    /// Load the tree-ensemble artifact and candidate list from disk
    pub fn load(model_path: &Path, candidates_path: &Path) -> Result<Self> {
        let model = TreeEnsemble::load(model_path)
            .with_context(|| format!("Failed to load model: {:?}", model_path))?;
        let candidates = CandidateVocabulary::load(candidates_path)
            .with_context(|| format!("Failed to load candidate items: {:?}", candidates_path))?;

        Ok(Self::new(Arc::new(model), candidates))
    }

    pub fn model(&self) -> &dyn YieldModel {
        self.model.as_ref()
    }

    pub fn candidates(&self) -> &CandidateVocabulary {
        &self.candidates
    }

    /// Yield for one crop, with revenue when a price is given
    pub fn predict_point(
        &self,
        context: &FeatureContext,
        item: &str,
        scenario: ScenarioFlags,
        price: Option<Price>,
    ) -> EngineResult<PointPrediction> {
        predict_with_price(self.model(), context, item, scenario, price)
    }

    /// Top-K of the startup vocabulary by predicted yield
    pub fn rank_by_yield(
        &self,
        context: &FeatureContext,
        scenario: ScenarioFlags,
        top_k: usize,
    ) -> EngineResult<Vec<RankedRow>> {
        rank_by_yield(self.model(), context, self.candidates.items(), scenario, top_k)
    }

    /// Top-K of the startup vocabulary (priced items only) by revenue per hectare
    pub fn rank_by_revenue(
        &self,
        context: &FeatureContext,
        prices: &PriceTable,
        price_unit: PriceUnit,
        scenario: ScenarioFlags,
        top_k: usize,
    ) -> EngineResult<Vec<RankedRow>> {
        rank_by_revenue(
            self.model(),
            context,
            self.candidates.items(),
            prices,
            price_unit,
            scenario,
            top_k,
        )
    }
}
