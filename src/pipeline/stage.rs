//! Pipeline stages and the orchestrator's error type

use crate::data::Symbol;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

/// Step of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Cache,
    Features,
    Fit,
    Evaluate,
    Interpret,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Cache => "cache",
            Stage::Features => "features",
            Stage::Fit => "fit",
            Stage::Evaluate => "evaluate",
            Stage::Interpret => "interpret",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First failure of a run, tagged with where it happened
#[derive(ThisError, Debug)]
#[error("{symbol}: {stage} stage failed: {source}")]
pub struct PipelineError {
    pub symbol: Symbol,
    pub stage: Stage,
    pub source: Error,
}

impl PipelineError {
    pub fn new(symbol: &Symbol, stage: Stage, source: Error) -> Self {
        Self {
            symbol: symbol.clone(),
            stage,
            source,
        }
    }
}

/// Attach a stage to a library result
pub(crate) trait StageContext<T> {
    fn stage(self, symbol: &Symbol, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> StageContext<T> for crate::error::Result<T> {
    fn stage(self, symbol: &Symbol, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::new(symbol, stage, e))
    }
}
