//! Unit Conversion
//!
//! Converts a yield in hg/ha (the model's native unit) and a market price into
//! revenue per hectare.
//!
//! Conversion factors:
//! - `eur_per_t`:  1 t  = 10 000 hg  -> revenue = yield_hg_ha × price / 10 000
//! - `eur_per_kg`: 1 kg = 10 hg      -> revenue = yield_hg_ha × price / 10
//! - `eur_per_hg`: identity          -> revenue = yield_hg_ha × price

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{EngineError, EngineResult};

/// Hectograms per tonne
pub const HG_PER_TONNE: f64 = 10_000.0;

/// Hectograms per kilogram
pub const HG_PER_KG: f64 = 10.0;

/// Price unit accepted by the revenue conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriceUnit {
    #[default]
    EurPerTonne,
    EurPerKg,
    EurPerHg,
}

/// Synonym table: normalized spelling -> unit
const UNIT_SYNONYMS: [(&str, PriceUnit); 9] = [
    ("eur_per_t", PriceUnit::EurPerTonne),
    ("€/t", PriceUnit::EurPerTonne),
    ("euro_per_tonne", PriceUnit::EurPerTonne),
    ("eur_per_kg", PriceUnit::EurPerKg),
    ("€/kg", PriceUnit::EurPerKg),
    ("euro_per_kg", PriceUnit::EurPerKg),
    ("eur_per_hg", PriceUnit::EurPerHg),
    ("€/hg", PriceUnit::EurPerHg),
    ("euro_per_hg", PriceUnit::EurPerHg),
];

impl PriceUnit {
    /// Canonical code used in responses
    pub fn code(self) -> &'static str {
        match self {
            PriceUnit::EurPerTonne => "eur_per_t",
            PriceUnit::EurPerKg => "eur_per_kg",
            PriceUnit::EurPerHg => "eur_per_hg",
        }
    }

    /// Multiplier turning `yield_hg_ha × price` into revenue per hectare
    pub fn conversion_factor(self) -> f64 {
        match self {
            PriceUnit::EurPerTonne => 1.0 / HG_PER_TONNE,
            PriceUnit::EurPerKg => 1.0 / HG_PER_KG,
            PriceUnit::EurPerHg => 1.0,
        }
    }

    /// Normalize (trim + lowercase) and look the unit up in the synonym table
    pub fn parse(raw: &str) -> EngineResult<Self> {
        let normalized = raw.trim().to_lowercase();
        UNIT_SYNONYMS
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, unit)| *unit)
            .ok_or_else(|| EngineError::UnsupportedUnit {
                unit: raw.to_string(),
            })
    }
}

impl FromStr for PriceUnit {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceUnit::parse(s)
    }
}

impl fmt::Display for PriceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for PriceUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Revenue per hectare for a yield in hg/ha and a price in `unit`
///
/// No range validation: zero or negative inputs pass straight through.
pub fn revenue_per_ha(yield_hg_ha: f64, price_value: f64, unit: PriceUnit) -> f64 {
    match unit {
        PriceUnit::EurPerTonne => yield_hg_ha * (price_value / HG_PER_TONNE),
        PriceUnit::EurPerKg => yield_hg_ha * (price_value / HG_PER_KG),
        PriceUnit::EurPerHg => yield_hg_ha * price_value,
    }
}

/// String entry point: normalizes `price_unit` first, fails with
/// `UnsupportedUnit` when it is not recognized.
pub fn compute_revenue_per_ha(
    yield_hg_ha: f64,
    price_value: f64,
    price_unit: &str,
) -> EngineResult<f64> {
    let unit = PriceUnit::parse(price_unit)?;
    Ok(revenue_per_ha(yield_hg_ha, price_value, unit))
}

/// hg/ha -> t/ha
#[inline]
pub fn hg_ha_to_t_ha(yield_hg_ha: f64) -> f64 {
    yield_hg_ha / HG_PER_TONNE
}
