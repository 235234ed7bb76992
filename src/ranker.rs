//! Batch Ranking
//!
//! Scores a candidate list under one shared context and returns the top-K
//! rows, either by predicted yield or by predicted revenue per hectare.
//!
//! Both rankers build one feature row per candidate and call the model exactly
//! once per batch. A failed inference call fails the whole batch.
//!
//! Ordering: stable descending sort, so candidates with identical scores keep
//! their input order. NaN scores sort last.

use std::cmp::Ordering;
use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{EngineError, EngineResult};
use crate::features::FeatureContext;
use crate::model::{infer, YieldModel};
use crate::scenario::ScenarioFlags;
use crate::units::{hg_ha_to_t_ha, revenue_per_ha, PriceUnit};

/// Item -> price value, all in one shared unit
pub type PriceTable = FxHashMap<String, f64>;

/// One row of a ranking result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub item: String,
    pub pred_yield_hg_ha: f64,
    pub pred_yield_t_ha: f64,
    pub revenue_per_ha: Option<f64>,
    pub price_value: Option<f64>,
    pub price_unit: Option<PriceUnit>,
}

/// Descending comparison treating NaN as the lowest score
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// One inference call for all `items`, scenario bonus applied to each result
fn score_batch<S: AsRef<str>>(
    model: &dyn YieldModel,
    context: &FeatureContext,
    items: &[S],
    scenario: ScenarioFlags,
) -> EngineResult<Vec<f64>> {
    let rows = context.rows_for(items);
    let base = infer(model, &rows).map_err(|e| {
        tracing::error!("Batch inference failed for {} candidates: {}", rows.len(), e);
        EngineError::from(e)
    })?;

    let adj = scenario.bonus();
    Ok(base.into_iter().map(|p| p + adj).collect())
}

/// Top-K candidates by predicted yield
///
/// Returns `min(top_k, candidates.len())` rows. An empty candidate list
/// returns an empty result without calling the model.
pub fn rank_by_yield<S: AsRef<str>>(
    model: &dyn YieldModel,
    context: &FeatureContext,
    candidates: &[S],
    scenario: ScenarioFlags,
    top_k: usize,
) -> EngineResult<Vec<RankedRow>> {
    if candidates.is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }

    let start = Instant::now();
    let preds = score_batch(model, context, candidates, scenario)?;

    let mut rows: Vec<RankedRow> = candidates
        .iter()
        .zip(preds)
        .map(|(item, pred)| RankedRow {
            item: item.as_ref().to_string(),
            pred_yield_hg_ha: pred,
            pred_yield_t_ha: hg_ha_to_t_ha(pred),
            revenue_per_ha: None,
            price_value: None,
            price_unit: None,
        })
        .collect();

    // sort_by is stable: ties keep candidate order
    rows.sort_by(|a, b| descending(a.pred_yield_hg_ha, b.pred_yield_hg_ha));
    rows.truncate(top_k);

    tracing::debug!(
        "Ranked {} candidates by yield (top {}) in {:?}",
        candidates.len(),
        rows.len(),
        start.elapsed()
    );

    Ok(rows)
}

/// Top-K priced candidates by predicted revenue per hectare
///
/// Only candidates present in `prices` are scored, in candidate order. Every
/// supplied price must be strictly positive (`InvalidPrice` otherwise); no
/// overlap between candidates and prices fails with `NoPricedCandidates`.
pub fn rank_by_revenue<S: AsRef<str>>(
    model: &dyn YieldModel,
    context: &FeatureContext,
    candidates: &[S],
    prices: &PriceTable,
    price_unit: PriceUnit,
    scenario: ScenarioFlags,
    top_k: usize,
) -> EngineResult<Vec<RankedRow>> {
    validate_prices(prices)?;

    let priced: Vec<(&str, f64)> = candidates
        .iter()
        .filter_map(|it| {
            let item = it.as_ref();
            prices.get(item).map(|&price| (item, price))
        })
        .collect();

    if priced.is_empty() {
        return Err(EngineError::NoPricedCandidates);
    }
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let start = Instant::now();
    let items: Vec<&str> = priced.iter().map(|(item, _)| *item).collect();
    let preds = score_batch(model, context, &items, scenario)?;

    let mut rows: Vec<RankedRow> = priced
        .iter()
        .zip(preds)
        .map(|(&(item, price), pred)| RankedRow {
            item: item.to_string(),
            pred_yield_hg_ha: pred,
            pred_yield_t_ha: hg_ha_to_t_ha(pred),
            revenue_per_ha: Some(revenue_per_ha(pred, price, price_unit)),
            price_value: Some(price),
            price_unit: Some(price_unit),
        })
        .collect();

    rows.sort_by(|a, b| {
        descending(
            a.revenue_per_ha.unwrap_or(f64::NAN),
            b.revenue_per_ha.unwrap_or(f64::NAN),
        )
    });
    rows.truncate(top_k);

    tracing::debug!(
        "Ranked {} priced candidates ({} supplied prices) by revenue in {:?}",
        items.len(),
        prices.len(),
        start.elapsed()
    );

    Ok(rows)
}

/// Reject any price that is not strictly positive (NaN included)
pub fn validate_prices(prices: &PriceTable) -> EngineResult<()> {
    let mut bad: Vec<String> = prices
        .iter()
        .filter(|(_, v)| !(**v > 0.0))
        .map(|(k, _)| k.clone())
        .collect();

    if bad.is_empty() {
        return Ok(());
    }
    bad.sort();
    Err(EngineError::InvalidPrice { items: bad })
}
