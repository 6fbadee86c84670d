//! On-disk artifacts of a run
//!
//! Each artifact is a JSON array of records, pretty-printed with two-space
//! indentation and free of timestamps, so identical runs write identical
//! bytes. A status record next to them tells consumers whether the set is
//! complete.

use super::stage::Stage;
use crate::data::{DataLoader, PriceSeries, Symbol};
use crate::error::{Error, Result};
use crate::evaluation::Metrics;
use crate::models::FeatureImportance;
use serde::de::DeserializeOwned;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Row of `metrics_{SYMBOL}.json`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub mae: f64,
    pub r2: f64,
    pub directional_accuracy: f64,
}

impl From<Metrics> for MetricsRecord {
    fn from(m: Metrics) -> Self {
        Self {
            mae: m.mean_absolute_error,
            r2: m.r_squared,
            directional_accuracy: m.directional_accuracy,
        }
    }
}

/// Row of `stock_info_{SYMBOL}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockInfoRecord {
    pub company: String,
    pub symbol: String,
    pub last_close: f64,
    /// `YYYY-MM-DD`
    pub last_date: String,
}

/// The three artifacts of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub metrics: MetricsRecord,
    pub importances: Vec<FeatureImportance>,
    pub info: StockInfoRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Committing,
    Succeeded,
    Failed,
}

/// Content of `status_{SYMBOL}.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: StatusKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunStatus {
    fn of(state: StatusKind) -> Self {
        Self {
            state,
            stage: None,
            error: None,
        }
    }
}

/// What a consumer finds on disk for a symbol
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// Nothing has been written for the symbol
    NeverRun,
    /// The most recent run stopped at `stage`
    Failed { stage: Option<Stage>, error: String },
    /// A commit started but never finished; artifacts may be mixed until
    /// the next successful run. `error` is set when the failure was caught.
    Interrupted { error: Option<String> },
    /// Files are present but unreadable or incomplete
    Malformed(String),
    Succeeded(Artifacts),
}

/// Exclusive hold on one symbol's artifact set, shared by every process
/// using the same directory. Released on drop.
#[derive(Debug)]
pub struct SymbolLock {
    _file: File,
}

/// Reads and writes the artifact set of each symbol under one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metrics_path(&self, symbol: &Symbol) -> PathBuf {
        self.dir.join(format!("metrics_{}.json", symbol))
    }

    pub fn importance_path(&self, symbol: &Symbol) -> PathBuf {
        self.dir.join(format!("feature_importance_{}.json", symbol))
    }

    pub fn info_path(&self, symbol: &Symbol) -> PathBuf {
        self.dir.join(format!("stock_info_{}.json", symbol))
    }

    pub fn status_path(&self, symbol: &Symbol) -> PathBuf {
        self.dir.join(format!("status_{}.json", symbol))
    }

    pub fn lock_path(&self, symbol: &Symbol) -> PathBuf {
        self.dir.join(format!(".{}.lock", symbol))
    }

    /// Block until no other process holds `symbol` in this directory
    pub fn lock(&self, symbol: &Symbol) -> Result<SymbolLock> {
        std::fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path(symbol))?;
        file.lock_exclusive()?;
        Ok(SymbolLock { _file: file })
    }

    /// Replace the symbol's artifact set.
    ///
    /// All three files are staged before any is renamed into place. The
    /// status reads `committing` for the duration of the renames and
    /// `succeeded` once they are done.
    pub fn commit(&self, symbol: &Symbol, artifacts: &Artifacts) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let files = [
            (self.metrics_path(symbol), to_json(&[artifacts.metrics])?),
            (self.importance_path(symbol), to_json(&artifacts.importances)?),
            (self.info_path(symbol), to_json(&[&artifacts.info])?),
        ];

        // Staged files are removed on drop unless persisted
        let mut staged = Vec::with_capacity(files.len());
        for (path, content) in &files {
            staged.push(stage_file(path, content.as_bytes())?);
        }

        self.write_status(symbol, &RunStatus::of(StatusKind::Committing))?;

        for ((path, _), tmp) in files.iter().zip(staged) {
            tmp.persist(path).map_err(|e| e.error)?;
        }

        self.write_status(symbol, &RunStatus::of(StatusKind::Succeeded))?;
        debug!(symbol = %symbol, dir = %self.dir.display(), "artifacts committed");
        Ok(())
    }

    /// Mark the symbol's latest run as failed; existing artifacts are untouched.
    ///
    /// A commit that stopped between renames stays `committing`, since only a
    /// later successful commit makes the set consistent again.
    pub fn record_failure(&self, symbol: &Symbol, stage: Stage, error: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let state = match self.read_status(symbol) {
            Some(RunStatus {
                state: StatusKind::Committing,
                ..
            }) => StatusKind::Committing,
            _ => StatusKind::Failed,
        };
        self.write_status(
            symbol,
            &RunStatus {
                state,
                stage: Some(stage),
                error: Some(error.to_string()),
            },
        )
    }

    fn read_status(&self, symbol: &Symbol) -> Option<RunStatus> {
        let content = std::fs::read_to_string(self.status_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write_status(&self, symbol: &Symbol, status: &RunStatus) -> Result<()> {
        write_atomic(&self.status_path(symbol), to_json(status)?.as_bytes())
    }

    /// Inspect what is on disk for `symbol`
    pub fn load(&self, symbol: &Symbol) -> Result<RunState> {
        let status_path = self.status_path(symbol);

        if !status_path.exists() {
            let any_artifact = [
                self.metrics_path(symbol),
                self.importance_path(symbol),
                self.info_path(symbol),
            ]
            .iter()
            .any(|p| p.exists());

            if !any_artifact {
                return Ok(RunState::NeverRun);
            }
            // Artifacts without a status record come from an external writer
            return Ok(self.read_artifacts(symbol));
        }

        let content = std::fs::read_to_string(&status_path)?;
        let status: RunStatus = match serde_json::from_str(&content) {
            Ok(status) => status,
            Err(e) => return Ok(RunState::Malformed(format!("status record: {}", e))),
        };

        Ok(match status.state {
            StatusKind::Committing => RunState::Interrupted {
                error: status.error,
            },
            StatusKind::Failed => RunState::Failed {
                stage: status.stage,
                error: status.error.unwrap_or_default(),
            },
            StatusKind::Succeeded => self.read_artifacts(symbol),
        })
    }

    fn read_artifacts(&self, symbol: &Symbol) -> RunState {
        let metrics = match read_single::<MetricsRecord>(&self.metrics_path(symbol)) {
            Ok(m) => m,
            Err(e) => return RunState::Malformed(format!("metrics: {}", e)),
        };
        let importances = match read_records::<FeatureImportance>(&self.importance_path(symbol)) {
            Ok(i) => i,
            Err(e) => return RunState::Malformed(format!("feature importance: {}", e)),
        };
        let info = match read_single::<StockInfoRecord>(&self.info_path(symbol)) {
            Ok(i) => i,
            Err(e) => return RunState::Malformed(format!("stock info: {}", e)),
        };

        RunState::Succeeded(Artifacts {
            metrics,
            importances,
            info,
        })
    }
}

/// Overwrite the raw price cache for the series' symbol
pub fn write_price_history(data_dir: &Path, series: &PriceSeries) -> Result<PathBuf> {
    std::fs::create_dir_all(data_dir)?;

    let mut buf = Vec::new();
    DataLoader::write_bars(series.bars(), &mut buf)?;

    let path = DataLoader::cache_path(data_dir, series.symbol());
    write_atomic(&path, &buf)?;
    Ok(path)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn read_single<T: DeserializeOwned>(path: &Path) -> Result<T> {
    read_records(path)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Artifact(format!("{} holds no records", path.display())))
}

/// Write `content` next to `path` under a name unique to this call
fn stage_file(path: &Path, content: &[u8]) -> Result<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    Ok(tmp)
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    stage_file(path, content)?.persist(path).map_err(|e| e.error)?;
    Ok(())
}
