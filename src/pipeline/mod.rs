//! Pipeline orchestrator and its on-disk artifact store

mod artifacts;
mod gate;
mod runner;
mod stage;

pub use artifacts::{
    write_price_history, ArtifactStore, Artifacts, MetricsRecord, RunState, RunStatus, StatusKind,
    StockInfoRecord, SymbolLock,
};
pub use gate::RunGate;
pub use runner::{analyze, run_pipeline, Pipeline, RunReport};
pub use stage::{PipelineError, Stage};
