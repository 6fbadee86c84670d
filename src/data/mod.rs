//! Data structures and preprocessing module
//!
//! Provides core data types for market data and ML datasets.

mod bar;
mod dataset;
mod loader;
mod symbol;

pub use bar::{PriceBar, PriceSeries};
pub use dataset::{Dataset, Split};
pub use loader::DataLoader;
pub use symbol::Symbol;

#[cfg(test)]
pub(crate) use bar::tests::bars_from_closes;
