//! Dataset structure for machine learning

use chrono::NaiveDate;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Dataset for machine learning with features and labels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Feature matrix (n_samples x n_features)
    pub features: Vec<Vec<f64>>,
    /// Target labels
    pub labels: Vec<f64>,
    /// Feature names, one per column
    pub feature_names: Vec<String>,
    /// Trading date of each sample
    pub dates: Vec<NaiveDate>,
}

/// Chronological train/evaluation partition
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    /// Create a new empty dataset
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            features: Vec::new(),
            labels: Vec::new(),
            feature_names,
            dates: Vec::new(),
        }
    }

    /// Number of samples
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    /// Number of features
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Add a sample
    pub fn add_sample(&mut self, features: Vec<f64>, label: f64, date: NaiveDate) {
        assert_eq!(features.len(), self.feature_names.len());
        self.features.push(features);
        self.labels.push(label);
        self.dates.push(date);
    }

    /// Column index of a named feature
    pub fn column(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Split into train and test sets by position, never shuffled.
    ///
    /// The evaluation partition takes `ceil(test_ratio * n)` trailing rows.
    pub fn train_test_split(&self, test_ratio: f64) -> Split {
        let n = self.n_samples();
        let n_test = ((test_ratio * n as f64).ceil() as usize).min(n);
        let train_size = n - n_test;

        let train = self.range(0, train_size);
        let test = self.range(train_size, n);

        Split { train, test }
    }

    fn range(&self, start: usize, end: usize) -> Dataset {
        Dataset {
            features: self.features[start..end].to_vec(),
            labels: self.labels[start..end].to_vec(),
            feature_names: self.feature_names.clone(),
            dates: self.dates[start..end].to_vec(),
        }
    }

    /// Create a subset of the dataset by indices
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            feature_names: self.feature_names.clone(),
            dates: indices.iter().map(|&i| self.dates[i]).collect(),
        }
    }

    /// Row indices of a bootstrap sample (drawn with replacement)
    pub fn bootstrap_indices(&self, seed: u64) -> Vec<usize> {
        let n = self.n_samples();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }

    /// Number of distinct label values (exact comparison)
    pub fn distinct_labels(&self) -> usize {
        let mut labels = self.labels.clone();
        labels.sort_by(|a, b| a.total_cmp(b));
        labels.dedup_by(|a, b| a == b);
        labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(i: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i)
    }

    fn sample_dataset(n: usize) -> Dataset {
        let mut dataset = Dataset::new(vec!["f1".to_string(), "f2".to_string()]);
        for i in 0..n {
            dataset.add_sample(vec![i as f64, -(i as f64)], i as f64 * 0.01, day(i as i64));
        }
        dataset
    }

    #[test]
    fn test_dataset_operations() {
        let dataset = sample_dataset(3);
        assert_eq!(dataset.n_samples(), 3);
        assert_eq!(dataset.n_features(), 2);
        assert_eq!(dataset.column("f2"), Some(1));
        assert_eq!(dataset.column("f3"), None);
    }

    #[test]
    fn test_split_sizes_round_evaluation_up() {
        let split = sample_dataset(10).train_test_split(0.2);
        assert_eq!(split.train.n_samples(), 8);
        assert_eq!(split.test.n_samples(), 2);

        let split = sample_dataset(11).train_test_split(0.2);
        assert_eq!(split.train.n_samples(), 8);
        assert_eq!(split.test.n_samples(), 3);
    }

    #[test]
    fn test_split_is_chronological() {
        for n in 2..40 {
            let split = sample_dataset(n).train_test_split(0.2);
            if split.train.is_empty() || split.test.is_empty() {
                continue;
            }
            let max_train = split.train.dates.iter().max().unwrap();
            let min_test = split.test.dates.iter().min().unwrap();
            assert!(max_train < min_test, "leak at n={}", n);
        }
    }

    #[test]
    fn test_bootstrap_is_seeded() {
        let dataset = sample_dataset(50);
        assert_eq!(dataset.bootstrap_indices(7), dataset.bootstrap_indices(7));
        assert_ne!(dataset.bootstrap_indices(7), dataset.bootstrap_indices(8));
        assert!(dataset.bootstrap_indices(7).iter().all(|&i| i < 50));
    }

    #[test]
    fn test_distinct_labels() {
        let mut dataset = Dataset::new(vec!["x".to_string()]);
        dataset.add_sample(vec![1.0], 0.5, day(0));
        dataset.add_sample(vec![2.0], 0.5, day(1));
        assert_eq!(dataset.distinct_labels(), 1);
        dataset.add_sample(vec![3.0], -0.5, day(2));
        assert_eq!(dataset.distinct_labels(), 2);
    }
}
