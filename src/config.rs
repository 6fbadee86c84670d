//! Configuration management
//!
//! Loaded from TOML; every section has defaults so a partial file is valid.

use crate::error::{Error, Result};
use crate::features::DEFAULT_MIN_ROWS;
use crate::models::{ForestConfig, DEFAULT_TEST_RATIO};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Market data configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// First day of history requested from the provider
    pub start_date: NaiveDate,
    /// Directory of the raw price cache
    pub data_dir: PathBuf,
    /// Replay the cache instead of calling the provider
    pub offline: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or(NaiveDate::MIN),
            data_dir: PathBuf::from("data"),
            offline: false,
        }
    }
}

/// Train/evaluation split configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of the most recent rows held out for evaluation
    pub test_ratio: f64,
    /// Fewest usable feature rows a run accepts
    pub min_rows: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: DEFAULT_TEST_RATIO,
            min_rows: DEFAULT_MIN_ROWS,
        }
    }
}

/// Artifact output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub model: ForestConfig,
    pub split: SplitConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file, or the defaults when there is no file.
    ///
    /// A file that exists but does not parse or validate is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> Result<()> {
        let ratio = self.split.test_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(Error::Config(format!(
                "split.test_ratio must lie strictly between 0 and 1, got {}",
                ratio
            )));
        }
        if self.split.min_rows == 0 {
            return Err(Error::Config("split.min_rows must be positive".to_string()));
        }
        if self.model.n_trees == 0 {
            return Err(Error::Config("model.n_trees must be positive".to_string()));
        }
        if self.model.min_samples_leaf == 0 {
            return Err(Error::Config(
                "model.min_samples_leaf must be positive".to_string(),
            ));
        }
        if self.model.max_features == Some(0) {
            return Err(Error::Config("model.max_features must be positive".to_string()));
        }
        Ok(())
    }
}
