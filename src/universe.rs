//! Instruments offered for analysis, grouped by market

use crate::data::Symbol;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    UsStocks,
    CanadianStocks,
    IndianStocks,
    CanadianEtfs,
}

impl Market {
    pub const ALL: [Market; 4] = [
        Market::UsStocks,
        Market::CanadianStocks,
        Market::IndianStocks,
        Market::CanadianEtfs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Market::UsStocks => "US Stocks",
            Market::CanadianStocks => "Canadian Stocks",
            Market::IndianStocks => "Indian Stocks",
            Market::CanadianEtfs => "Canadian ETFs",
        }
    }

    pub fn tickers(&self) -> &'static [&'static str] {
        match self {
            Market::UsStocks => &["MSFT", "AAPL", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX"],
            Market::CanadianStocks => &[
                "SHOP", "RY", "TD", "BNS", "BMO", "ENB", "CNQ", "CP", "CNR", "SU",
            ],
            Market::IndianStocks => &[
                "RELIANCE.NS",
                "TCS.NS",
                "INFY.NS",
                "HDFCBANK.NS",
                "ICICIBANK.NS",
                "SBIN.NS",
                "HINDUNILVR.NS",
                "ITC.NS",
                "LT.NS",
                "BHARTIARTL.NS",
            ],
            Market::CanadianEtfs => &["XIU.TO", "VCN.TO", "VFV.TO", "XIC.TO", "ZCN.TO"],
        }
    }

    pub fn symbols(&self) -> Result<Vec<Symbol>> {
        self.tickers().iter().map(|t| Symbol::new(t)).collect()
    }

    /// Market listing the given ticker, if any
    pub fn of(symbol: &Symbol) -> Option<Market> {
        Market::ALL
            .into_iter()
            .find(|m| m.tickers().contains(&symbol.as_str()))
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
