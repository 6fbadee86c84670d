//! Feature construction from a daily price series

use super::indicators::{lag, lead, pct_change, rolling_std, sma};
use crate::data::{Dataset, PriceSeries};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Version of the feature-name contract shared with the forecast model
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Model input columns, in the order the model consumes them
pub const FEATURE_NAMES: [&str; 7] = [
    "return_1",
    "return_2",
    "return_5",
    "ma_5",
    "ma_10",
    "volatility_5",
    "day_of_week",
];

/// Bars that must precede a bar before it can produce a row
pub const WARMUP_BARS: usize = 10;

/// Fewest rows that still leave both partitions non-empty in practice
pub const DEFAULT_MIN_ROWS: usize = 10;

/// Derived features of one bar plus its look-ahead target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub close: f64,
    /// Return realized one bar earlier
    pub return_1: f64,
    /// Return realized two bars earlier
    pub return_2: f64,
    /// Return realized five bars earlier
    pub return_5: f64,
    pub ma_5: f64,
    pub ma_10: f64,
    pub volatility_5: f64,
    /// Monday = 0 … Sunday = 6
    pub day_of_week: u32,
    /// Return realized on the next bar; never a model input
    pub target: f64,
}

impl FeatureRow {
    /// Value of a named input column
    pub fn value(&self, name: &str) -> Option<f64> {
        match name {
            "return_1" => Some(self.return_1),
            "return_2" => Some(self.return_2),
            "return_5" => Some(self.return_5),
            "ma_5" => Some(self.ma_5),
            "ma_10" => Some(self.ma_10),
            "volatility_5" => Some(self.volatility_5),
            "day_of_week" => Some(self.day_of_week as f64),
            _ => None,
        }
    }

    fn is_complete(&self) -> bool {
        [
            self.close,
            self.return_1,
            self.return_2,
            self.return_5,
            self.ma_5,
            self.ma_10,
            self.volatility_5,
            self.target,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Turns a price series into model-ready feature rows
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    min_rows: usize,
}

impl FeatureBuilder {
    pub fn new() -> Self {
        Self {
            min_rows: DEFAULT_MIN_ROWS,
        }
    }

    /// Require at least `min_rows` rows after warm-up and target alignment
    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows;
        self
    }

    /// Build feature rows, failing when too few usable rows remain
    pub fn build(&self, series: &PriceSeries) -> Result<Vec<FeatureRow>> {
        let rows = self.generate(series);

        if rows.len() < self.min_rows {
            return Err(Error::DataInsufficient {
                rows: rows.len(),
                required: self.min_rows,
            });
        }

        Ok(rows)
    }

    /// Build every fully defined row without the minimum-size check
    pub fn generate(&self, series: &PriceSeries) -> Vec<FeatureRow> {
        let bars = series.bars();
        let closes = series.closes();

        let returns = pct_change(&closes);
        let return_1 = lag(&returns, 1);
        let return_2 = lag(&returns, 2);
        let return_5 = lag(&returns, 5);
        let ma_5 = sma(&closes, 5);
        let ma_10 = sma(&closes, 10);
        let volatility_5 = rolling_std(&returns, 5);
        let target = lead(&returns, 1);

        let rows: Vec<FeatureRow> = (WARMUP_BARS..bars.len())
            .map(|i| FeatureRow {
                date: bars[i].date,
                close: closes[i],
                return_1: return_1[i],
                return_2: return_2[i],
                return_5: return_5[i],
                ma_5: ma_5[i],
                ma_10: ma_10[i],
                volatility_5: volatility_5[i],
                day_of_week: bars[i].day_of_week(),
                target: target[i],
            })
            .filter(FeatureRow::is_complete)
            .collect();

        debug!(
            symbol = %series.symbol(),
            bars = bars.len(),
            rows = rows.len(),
            "generated feature rows"
        );

        rows
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that every contract column is available in `columns`
pub fn validate_schema<S: AsRef<str>>(columns: &[S]) -> Result<()> {
    for required in FEATURE_NAMES {
        if !columns.iter().any(|c| c.as_ref() == required) {
            return Err(Error::FeatureSchema {
                version: FEATURE_SCHEMA_VERSION,
                column: required.to_string(),
            });
        }
    }
    Ok(())
}

/// Assemble the named columns of `rows` into a dataset targeting `target`
pub fn to_dataset(rows: &[FeatureRow], columns: &[&str]) -> Result<Dataset> {
    let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let mut dataset = Dataset::new(names);

    for row in rows {
        let values = columns
            .iter()
            .map(|&c| {
                row.value(c).ok_or_else(|| Error::FeatureSchema {
                    version: FEATURE_SCHEMA_VERSION,
                    column: c.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        dataset.add_sample(values, row.target, row.date);
    }

    Ok(dataset)
}
