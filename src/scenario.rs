//! Scenario Adjustment
//!
//! What-if post-adjustment for irrigation and fertilizer: flat additive
//! effects in hg/ha, applied on top of the model's base prediction.

use serde::Deserialize;

/// Mean yield gain from irrigation (hg/ha)
pub const IRRIGATION_BONUS_HG_HA: f64 = 12_000.0;

/// Mean yield gain from fertilizer (hg/ha)
pub const FERTILIZER_BONUS_HG_HA: f64 = 15_000.0;

/// Irrigation / fertilizer switches shared by every row of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct ScenarioFlags {
    #[serde(default)]
    pub irrigation: bool,
    #[serde(default)]
    pub fertilizer: bool,
}

impl ScenarioFlags {
    pub fn new(irrigation: bool, fertilizer: bool) -> Self {
        Self { irrigation, fertilizer }
    }

    /// Total additive bonus for these flags
    pub fn bonus(&self) -> f64 {
        let mut adj = 0.0;
        if self.irrigation {
            adj += IRRIGATION_BONUS_HG_HA;
        }
        if self.fertilizer {
            adj += FERTILIZER_BONUS_HG_HA;
        }
        adj
    }

    /// Apply the bonus to a base yield
    pub fn apply(&self, base_yield_hg_ha: f64) -> f64 {
        base_yield_hg_ha + self.bonus()
    }
}

/// Adjust a base yield (hg/ha) for the given scenario
///
/// The base value is not range-checked; negative or zero bases come back
/// shifted by the bonus only.
pub fn adjust(base_yield_hg_ha: f64, irrigation: bool, fertilizer: bool) -> f64 {
    ScenarioFlags::new(irrigation, fertilizer).apply(base_yield_hg_ha)
}
