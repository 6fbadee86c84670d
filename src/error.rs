//! Error types for the forecasting pipeline

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised by a market data source.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure talking to the provider
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider does not know the requested symbol
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider answered but the payload was unusable
    #[error("provider error: {0}")]
    Provider(String),

    /// Local replay source could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Local replay source was malformed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Market data could not be obtained
    #[error("data fetch failed: {0}")]
    DataFetch(#[from] FetchError),

    /// Price series violates ordering or value constraints
    #[error("invalid price series: {0}")]
    InvalidSeries(String),

    /// Symbol cannot be used as an artifact key
    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Too few usable feature rows after warm-up and target alignment
    #[error("insufficient data: {rows} usable rows, at least {required} required")]
    DataInsufficient { rows: usize, required: usize },

    /// A required feature column is missing from the dataset
    #[error("feature schema v{version} mismatch: missing column `{column}`")]
    FeatureSchema { version: u32, column: String },

    /// Training data cannot produce a meaningful fit
    #[error("model fit failed: {0}")]
    ModelFit(String),

    /// Nothing to evaluate against
    #[error("evaluation set is empty")]
    EmptyEvaluationSet,

    /// Actuals and predictions are not aligned
    #[error("length mismatch: {actual} actual values, {predicted} predictions")]
    LengthMismatch { actual: usize, predicted: usize },

    /// Not enough raw bars to derive an interpretation input
    #[error("insufficient history for {quantity}: {available} bars, {required} required")]
    InsufficientHistory {
        quantity: &'static str,
        available: usize,
        required: usize,
    },

    /// Artifact file exists but holds no usable record
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Background worker died before returning
    #[error("worker task failed: {0}")]
    Worker(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration file parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file write error
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// True for failures caused by the market data collaborator
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Error::DataFetch(_))
    }
}
