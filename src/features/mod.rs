//! Feature engineering module
//!
//! Lagged returns, moving averages, rolling volatility and calendar features
//! built from daily closes, plus the named column contract the model reads.

mod builder;
mod indicators;

pub use builder::{
    to_dataset, validate_schema, FeatureBuilder, FeatureRow, DEFAULT_MIN_ROWS,
    FEATURE_NAMES, FEATURE_SCHEMA_VERSION, WARMUP_BARS,
};
pub use indicators::*;
