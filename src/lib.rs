//! # Stock Forecast - next-period return forecasting for equities
//!
//! Downloads daily price history, derives lagged return and moving-average
//! features, fits a seeded random forest on the older 80% of rows and
//! evaluates it on the most recent 20%. A run ends with three JSON
//! artifacts per symbol and a short-term outlook with a confidence score.
//!
//! ## Modules
//!
//! - `api` - Market data sources (Yahoo Finance, cached CSV, in-memory)
//! - `config` - TOML configuration
//! - `data` - Price bars, series and ML datasets
//! - `features` - Feature engineering with a versioned column contract
//! - `models` - Regression tree, random forest and the forecaster
//! - `evaluation` - MAE, R² and directional accuracy
//! - `interpretation` - Outlook, confidence score and turning points
//! - `pipeline` - Orchestration and the artifact store
//! - `universe` - Instruments grouped by market

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod interpretation;
pub mod models;
pub mod pipeline;
pub mod universe;

pub use api::{CsvSource, MarketDataSource, MemorySource, YahooClient};
pub use config::Config;
pub use data::{Dataset, PriceBar, PriceSeries, Symbol};
pub use error::{Error, FetchError, Result};
pub use models::{ForecastModel, RandomForest};
pub use pipeline::{run_pipeline, ArtifactStore, Pipeline, PipelineError, RunReport, RunState};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::api::{CsvSource, MarketDataSource, MemorySource, YahooClient};
    pub use crate::config::Config;
    pub use crate::data::{DataLoader, Dataset, PriceBar, PriceSeries, Split, Symbol};
    pub use crate::error::{Error, FetchError, Result};
    pub use crate::evaluation::{evaluate, Metrics};
    pub use crate::features::{FeatureBuilder, FeatureRow, FEATURE_NAMES};
    pub use crate::interpretation::{
        confidence_score, turning_points, ConfidenceBand, Interpretation, Outlook,
    };
    pub use crate::models::{DecisionTree, ForecastModel, ForestConfig, RandomForest, TreeConfig};
    pub use crate::pipeline::{
        analyze, ArtifactStore, Artifacts, Pipeline, PipelineError, RunReport, RunState, Stage,
    };
    pub use crate::universe::Market;
}
