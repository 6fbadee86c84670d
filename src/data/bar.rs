//! Daily OHLCV bars and the validated price series built from them

use super::Symbol;
use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
///
/// Field names serialize to the column headers used by the price cache
/// (`Date,Open,High,Low,Close,Volume`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Day of week with Monday = 0 … Sunday = 6
    pub fn day_of_week(&self) -> u32 {
        self.date.weekday().num_days_from_monday()
    }
}

/// Ordered price history for one instrument.
///
/// Dates are strictly increasing and every close is finite and positive.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: Symbol,
    display_name: Option<String>,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, bars: Vec<PriceBar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(Error::InvalidSeries(format!("no bars for {}", symbol)));
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(Error::InvalidSeries(format!(
                    "dates not strictly increasing at {} -> {}",
                    pair[0].date, pair[1].date
                )));
            }
        }

        if let Some(bar) = bars.iter().find(|b| !b.close.is_finite() || b.close <= 0.0) {
            return Err(Error::InvalidSeries(format!(
                "unusable close {} on {}",
                bar.close, bar.date
            )));
        }

        Ok(Self {
            symbol,
            display_name: None,
            bars,
        })
    }

    /// Attach the provider's display name for the instrument
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.display_name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Provider display name, falling back to the symbol
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.symbol.as_str())
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last(&self) -> &PriceBar {
        // Non-empty by construction
        &self.bars[self.bars.len() - 1]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let date = start + chrono::Duration::days(i as i64);
                PriceBar::new(date, c, c * 1.01, c * 0.99, c, 1_000 + i as u64)
            })
            .collect()
    }

    #[test]
    fn test_series_rejects_unordered_dates() {
        let mut bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        bars.swap(1, 2);
        let result = PriceSeries::new(Symbol::new("MSFT").unwrap(), bars);
        assert!(matches!(result, Err(Error::InvalidSeries(_))));
    }

    #[test]
    fn test_series_rejects_duplicate_dates() {
        let mut bars = bars_from_closes(&[10.0, 11.0]);
        bars[1].date = bars[0].date;
        assert!(PriceSeries::new(Symbol::new("MSFT").unwrap(), bars).is_err());
    }

    #[test]
    fn test_series_rejects_bad_close() {
        let mut bars = bars_from_closes(&[10.0, 11.0]);
        bars[1].close = f64::NAN;
        assert!(PriceSeries::new(Symbol::new("MSFT").unwrap(), bars).is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_symbol() {
        let series =
            PriceSeries::new(Symbol::new("TD").unwrap(), bars_from_closes(&[1.0, 2.0])).unwrap();
        assert_eq!(series.display_name(), "TD");

        let named = series.with_display_name("Toronto-Dominion Bank");
        assert_eq!(named.display_name(), "Toronto-Dominion Bank");
    }

    #[test]
    fn test_day_of_week_starts_monday() {
        // 2024-01-01 was a Monday
        let bars = bars_from_closes(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let days: Vec<u32> = bars.iter().map(|b| b.day_of_week()).collect();
        assert_eq!(days, vec![0, 1, 2, 3, 4, 5, 6]);
    }
}
