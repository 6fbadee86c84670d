//! Next-period return forecaster: chronological split, forest fit, ranking

use super::random_forest::{ForestConfig, RandomForest};
use crate::data::Dataset;
use crate::error::{Error, Result};
use crate::features::{to_dataset, validate_schema, FeatureRow, FEATURE_NAMES};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Share of rows held out for evaluation
pub const DEFAULT_TEST_RATIO: f64 = 0.2;

/// Importance of one input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Output of one fit: held-out predictions and the importance ranking
#[derive(Debug, Clone)]
pub struct Forecast {
    /// Rows used for training
    pub train_size: usize,
    /// Last training date
    pub train_end: NaiveDate,
    /// Dates of the evaluation rows, oldest first
    pub eval_dates: Vec<NaiveDate>,
    /// Realized targets of the evaluation rows
    pub actual: Vec<f64>,
    /// Model predictions for the evaluation rows
    pub predicted: Vec<f64>,
    /// Importances sorted descending
    pub importances: Vec<FeatureImportance>,
    /// The fitted forest
    pub model: RandomForest,
}

/// Fits a random forest on the chronological training partition of a
/// feature set and predicts the held-out tail.
#[derive(Debug, Clone)]
pub struct ForecastModel {
    config: ForestConfig,
    test_ratio: f64,
}

impl ForecastModel {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            test_ratio: DEFAULT_TEST_RATIO,
        }
    }

    pub fn with_test_ratio(mut self, test_ratio: f64) -> Self {
        self.test_ratio = test_ratio;
        self
    }

    pub fn fit_predict(&self, rows: &[FeatureRow]) -> Result<Forecast> {
        let dataset = to_dataset(rows, &FEATURE_NAMES)?;
        self.fit_predict_dataset(&dataset)
    }

    /// Fit on a prepared dataset; its columns must satisfy the feature contract
    pub fn fit_predict_dataset(&self, dataset: &Dataset) -> Result<Forecast> {
        validate_schema(&dataset.feature_names)?;

        let split = dataset.train_test_split(self.test_ratio);
        let train_end = match split.train.dates.last() {
            Some(&date) => date,
            None => return Err(Error::ModelFit("training partition is empty".to_string())),
        };

        info!(
            train = split.train.n_samples(),
            eval = split.test.n_samples(),
            trees = self.config.n_trees,
            seed = self.config.seed,
            "fitting random forest"
        );

        let mut model = RandomForest::new(self.config.clone());
        model.fit(&split.train)?;

        let predicted = model.predict(&split.test);

        let importances = model
            .feature_importance_ranking()
            .into_iter()
            .map(|(feature, importance)| FeatureImportance {
                feature: feature.to_string(),
                importance,
            })
            .collect();

        Ok(Forecast {
            train_size: split.train.n_samples(),
            train_end,
            eval_dates: split.test.dates,
            actual: split.test.labels,
            predicted,
            importances,
            model,
        })
    }
}

impl Default for ForecastModel {
    fn default() -> Self {
        Self::new(ForestConfig::default())
    }
}
