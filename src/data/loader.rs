//! CSV persistence for price bars
//!
//! The layout matches the cached download of the market data provider:
//! a header row `Date,Open,High,Low,Close,Volume` followed by one row per day.

use super::{PriceBar, Symbol};
use crate::error::Result;
use csv::{Reader, Writer};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Data loader for price CSV files
pub struct DataLoader;

impl DataLoader {
    /// Location of the cached history of `symbol` under `dir`
    pub fn cache_path(dir: &Path, symbol: &Symbol) -> PathBuf {
        dir.join(format!("{}.csv", symbol))
    }

    /// Load bars from a CSV file, sorted by date
    pub fn load_bars<P: AsRef<Path>>(path: P) -> Result<Vec<PriceBar>> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read_bars(file)
    }

    /// Read bars from any CSV reader, sorted by date
    pub fn read_bars<R: Read>(reader: R) -> Result<Vec<PriceBar>> {
        let mut reader = Reader::from_reader(reader);
        let mut bars = Vec::new();

        for result in reader.deserialize() {
            let bar: PriceBar = result?;
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    /// Write bars as CSV to any writer
    pub fn write_bars<W: Write>(bars: &[PriceBar], writer: W) -> Result<()> {
        let mut writer = Writer::from_writer(writer);

        for bar in bars {
            writer.serialize(bar)?;
        }

        writer.flush()?;
        Ok(())
    }
}
