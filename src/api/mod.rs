//! Market data access
//!
//! The pipeline only sees the [`MarketDataSource`] trait. The Yahoo Finance
//! chart client is the live implementation; cached CSV files and in-memory
//! bars can stand in for it.

mod client;
mod source;
mod types;

pub use client::YahooClient;
pub use source::{CsvSource, MarketDataSource, MemorySource};
