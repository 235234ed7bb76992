//! Feature Rows
//!
//! The model consumes rows with a fixed column order:
//! `[area, item, year, avg_rain_mm, pesticides_tonnes, avg_temp]`.
//! A `FeatureContext` holds everything except `item`, so one context is shared
//! across every candidate in a batch.

use serde::Deserialize;

/// Model input columns, in schema order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Area,
    Item,
    Year,
    AvgRainMm,
    PesticidesTonnes,
    AvgTemp,
}

/// Column order of every feature row
pub const FEATURE_COLUMNS: [Feature; 6] = [
    Feature::Area,
    Feature::Item,
    Feature::Year,
    Feature::AvgRainMm,
    Feature::PesticidesTonnes,
    Feature::AvgTemp,
];

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Area => "area",
            Feature::Item => "item",
            Feature::Year => "year",
            Feature::AvgRainMm => "avg_rain_mm",
            Feature::PesticidesTonnes => "pesticides_tonnes",
            Feature::AvgTemp => "avg_temp",
        }
    }

    /// Area and item are categorical; the rest are numeric
    pub fn is_categorical(self) -> bool {
        matches!(self, Feature::Area | Feature::Item)
    }
}

/// One environmental scenario (everything but the crop)
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureContext {
    pub area: String,
    pub year: i32,
    pub avg_rain_mm: f64,
    pub pesticides_tonnes: f64,
    pub avg_temp: f64,
}

impl FeatureContext {
    /// Single model row for `item` under this context
    pub fn row_for<'a>(&'a self, item: &'a str) -> FeatureRow<'a> {
        FeatureRow { context: self, item }
    }

    /// One row per candidate, aligned with `items`
    pub fn rows_for<'a, S: AsRef<str>>(&'a self, items: &'a [S]) -> Vec<FeatureRow<'a>> {
        items.iter().map(|it| self.row_for(it.as_ref())).collect()
    }
}

/// A single model input row, borrowing the shared context
#[derive(Debug, Clone, Copy)]
pub struct FeatureRow<'a> {
    pub context: &'a FeatureContext,
    pub item: &'a str,
}

impl<'a> FeatureRow<'a> {
    /// Categorical value, `None` for numeric columns
    pub fn categorical(&self, feature: Feature) -> Option<&'a str> {
        match feature {
            Feature::Area => Some(self.context.area.as_str()),
            Feature::Item => Some(self.item),
            _ => None,
        }
    }

    /// Numeric value, `None` for categorical columns
    pub fn numeric(&self, feature: Feature) -> Option<f64> {
        match feature {
            Feature::Year => Some(f64::from(self.context.year)),
            Feature::AvgRainMm => Some(self.context.avg_rain_mm),
            Feature::PesticidesTonnes => Some(self.context.pesticides_tonnes),
            Feature::AvgTemp => Some(self.context.avg_temp),
            Feature::Area | Feature::Item => None,
        }
    }
}
