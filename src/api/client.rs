//! Yahoo Finance chart client

use super::source::MarketDataSource;
use super::types::{trading_date, Chart, ChartData, ChartError, ChartResponse};
use crate::data::{PriceBar, PriceSeries, Symbol};
use crate::error::{FetchError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Daily history client for the Yahoo Finance chart API
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another chart endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0")
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch raw daily bars from `start` up to today, plus the display name
    pub async fn get_daily_bars(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
    ) -> std::result::Result<(Vec<PriceBar>, Option<String>), FetchError> {
        let period1 = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let period2 = Utc::now().timestamp();

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            symbol.as_str(),
            period1,
            period2
        );

        debug!("Fetching daily bars from: {}", url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::SymbolNotFound(symbol.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(symbol, status, &body));
        }

        let body: ChartResponse = response.json().await?;

        if let Some(error) = body.chart.error {
            return Err(chart_error(symbol, error));
        }

        let data = body
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;

        debug!(provider_symbol = %data.meta.symbol, "chart payload received");
        let name = data.meta.display_name().map(str::to_string);
        let bars = collect_bars(data);

        if bars.is_empty() {
            return Err(FetchError::SymbolNotFound(symbol.to_string()));
        }

        Ok((bars, name))
    }
}

/// Map a provider error object onto the fetch error kinds
fn chart_error(symbol: &Symbol, error: ChartError) -> FetchError {
    if error.is_not_found() {
        return FetchError::SymbolNotFound(symbol.to_string());
    }
    FetchError::Provider(format!(
        "{} - {}",
        error.code,
        error.description.unwrap_or_default()
    ))
}

/// Error for a non-success HTTP answer; rate limits and outages often come
/// without a JSON body
fn status_error(symbol: &Symbol, status: StatusCode, body: &str) -> FetchError {
    match serde_json::from_str::<ChartResponse>(body) {
        Ok(ChartResponse {
            chart: Chart {
                error: Some(error), ..
            },
        }) => match chart_error(symbol, error) {
            FetchError::Provider(detail) => {
                FetchError::Provider(format!("HTTP {}: {}", status, detail))
            }
            other => other,
        },
        _ => FetchError::Provider(format!("HTTP {}", status)),
    }
}

/// Complete rows only, ascending by date with one bar per day.
///
/// Prices are dividend and split adjusted when the provider sends adjusted
/// closes: the close is replaced by the adjusted close and open, high and
/// low are scaled by the same factor.
fn collect_bars(data: ChartData) -> Vec<PriceBar> {
    let timestamps = data.timestamp.unwrap_or_default();
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
    let adjusted = data
        .indicators
        .adjclose
        .into_iter()
        .next()
        .unwrap_or_default()
        .adjclose;

    let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let Some(date) = trading_date(ts, data.meta.gmtoffset) else {
            continue;
        };
        if let (Some(open), Some(high), Some(low), Some(close)) = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        ) {
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);
            let bar = match adjusted.get(i).copied().flatten() {
                Some(adj) if adj > 0.0 && close > 0.0 => {
                    let factor = adj / close;
                    PriceBar::new(date, open * factor, high * factor, low * factor, adj, volume)
                }
                _ => PriceBar::new(date, open, high, low, close, volume),
            };
            bars.push(bar);
        }
    }

    bars.sort_by_key(|b| b.date);
    // Keep the latest quote when the provider repeats a day
    bars.reverse();
    bars.dedup_by_key(|b| b.date);
    bars.reverse();
    bars
}

#[async_trait]
impl MarketDataSource for YahooClient {
    async fn fetch(&self, symbol: &Symbol, start: NaiveDate) -> Result<PriceSeries> {
        let (bars, name) = self.get_daily_bars(symbol, start).await?;

        info!(symbol = %symbol, bars = bars.len(), "downloaded daily history");

        let series = PriceSeries::new(symbol.clone(), bars)?;
        Ok(match name {
            Some(name) => series.with_display_name(name),
            None => series,
        })
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
