//! Machine learning models module
//!
//! Regression trees, the random forest built from them, and the forecaster
//! that fits the forest on the chronological training partition.

mod decision_tree;
mod forecaster;
mod random_forest;

pub use decision_tree::{DecisionTree, TreeConfig, TreeNode};
pub use forecaster::{FeatureImportance, Forecast, ForecastModel, DEFAULT_TEST_RATIO};
pub use random_forest::{ForestConfig, RandomForest};
