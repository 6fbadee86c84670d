//! Instrument symbol

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticker symbol as understood by the market data provider (e.g. `MSFT`,
/// `RELIANCE.NS`, `XIU.TO`).
///
/// The symbol doubles as the key of the on-disk artifact set, so only
/// characters that are safe inside a file name are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    const MAX_LEN: usize = 32;

    pub fn new(s: &str) -> Result<Self> {
        let s = s.trim();
        let valid = !s.is_empty()
            && s.len() <= Self::MAX_LEN
            && !s.starts_with('.')
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=' | '_'));

        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidSymbol(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Symbol::new(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl std::str::FromStr for Symbol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Symbol::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_exchange_suffixes() {
        assert_eq!(Symbol::new("RELIANCE.NS").unwrap().as_str(), "RELIANCE.NS");
        assert_eq!(Symbol::new(" XIU.TO ").unwrap().as_str(), "XIU.TO");
        assert!(Symbol::new("^GSPC").is_ok());
    }

    #[test]
    fn test_rejects_path_like_symbols() {
        assert!(Symbol::new("").is_err());
        assert!(Symbol::new("../etc").is_err());
        assert!(Symbol::new("A/B").is_err());
        assert!(Symbol::new("..").is_err());
    }
}
