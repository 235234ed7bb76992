//! Point Prediction
//!
//! Yield for one (context, crop) pair: one model row, one inference call,
//! then the scenario bonus.

use serde::Serialize;

use crate::error::EngineResult;
use crate::features::FeatureContext;
use crate::model::{infer, YieldModel};
use crate::scenario::ScenarioFlags;
use crate::units::{hg_ha_to_t_ha, revenue_per_ha, PriceUnit};

/// Point prediction result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointPrediction {
    pub item: String,
    pub pred_yield_hg_ha: f64,
    pub pred_yield_t_ha: f64,
    pub revenue_per_ha: Option<f64>,
}

/// Price attached to a point prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Price {
    pub value: f64,
    pub unit: PriceUnit,
}

/// Predicted yield (hg/ha) for `item`, scenario-adjusted
///
/// Inference errors are returned unchanged as `InferenceFailure`.
pub fn predict_point(
    model: &dyn YieldModel,
    context: &FeatureContext,
    item: &str,
    scenario: ScenarioFlags,
) -> EngineResult<f64> {
    let row = context.row_for(item);
    let preds = infer(model, std::slice::from_ref(&row))?;
    Ok(scenario.apply(preds[0]))
}

/// Point prediction with derived t/ha and optional revenue
///
/// The price is not range-checked here: zero or negative prices produce a
/// zero or negative revenue.
pub fn predict_with_price(
    model: &dyn YieldModel,
    context: &FeatureContext,
    item: &str,
    scenario: ScenarioFlags,
    price: Option<Price>,
) -> EngineResult<PointPrediction> {
    let pred_yield_hg_ha = predict_point(model, context, item, scenario)?;

    Ok(PointPrediction {
        item: item.to_string(),
        pred_yield_hg_ha,
        pred_yield_t_ha: hg_ha_to_t_ha(pred_yield_hg_ha),
        revenue_per_ha: price.map(|p| revenue_per_ha(pred_yield_hg_ha, p.value, p.unit)),
    })
}
