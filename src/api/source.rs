//! Market data sources

use crate::data::{DataLoader, PriceBar, PriceSeries, Symbol};
use crate::error::{Error, FetchError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Provider of daily price history for one symbol
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily bars from `start` to the most recent available day, ascending
    async fn fetch(&self, symbol: &Symbol, start: NaiveDate) -> Result<PriceSeries>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Replays previously cached `{SYMBOL}.csv` files
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl MarketDataSource for CsvSource {
    async fn fetch(&self, symbol: &Symbol, start: NaiveDate) -> Result<PriceSeries> {
        let path = DataLoader::cache_path(&self.dir, symbol);
        if !path.exists() {
            return Err(FetchError::SymbolNotFound(symbol.to_string()).into());
        }

        debug!(path = %path.display(), "replaying cached prices");

        let bars = tokio::task::spawn_blocking(move || DataLoader::load_bars(&path))
            .await
            .map_err(|e| Error::Worker(e.to_string()))??;

        series_from(symbol, bars, start)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// In-memory source, mostly for tests and offline demos
#[derive(Default)]
pub struct MemorySource {
    data: HashMap<Symbol, Vec<PriceBar>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: Symbol, bars: Vec<PriceBar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: Symbol, bars: Vec<PriceBar>) {
        self.data.insert(symbol, bars);
    }
}

#[async_trait]
impl MarketDataSource for MemorySource {
    async fn fetch(&self, symbol: &Symbol, start: NaiveDate) -> Result<PriceSeries> {
        let bars = self
            .data
            .get(symbol)
            .cloned()
            .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;

        series_from(symbol, bars, start)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Bars on or after `start`; an empty window counts as an unknown symbol
fn series_from(symbol: &Symbol, mut bars: Vec<PriceBar>, start: NaiveDate) -> Result<PriceSeries> {
    bars.retain(|b| b.date >= start);
    if bars.is_empty() {
        return Err(FetchError::SymbolNotFound(symbol.to_string()).into());
    }
    PriceSeries::new(symbol.clone(), bars)
}
