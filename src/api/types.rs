//! Response types of the Yahoo Finance chart endpoint

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartData>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}

impl ChartError {
    pub fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
    }
}

#[derive(Debug, Deserialize)]
pub struct ChartData {
    pub meta: ChartMeta,
    pub timestamp: Option<Vec<i64>>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    pub gmtoffset: i64,
}

impl ChartMeta {
    pub fn display_name(&self) -> Option<&str> {
        self.long_name
            .as_deref()
            .or(self.short_name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    pub quote: Vec<Quote>,
    /// Dividend and split adjusted closes, absent for some instruments
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

/// Exchange-local trading date of a bar timestamp
pub fn trading_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chart_payload() {
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": {"symbol": "MSFT", "longName": "Microsoft Corporation", "gmtoffset": -18000},
                    "timestamp": [1704205800, 1704292200],
                    "indicators": {"quote": [{
                        "open": [373.86, 369.01],
                        "high": [375.9, 373.26],
                        "low": [366.77, 368.51],
                        "close": [370.87, null],
                        "volume": [25258600, 23083500]
                    }],
                    "adjclose": [{"adjclose": [368.95, null]}]}
                }],
                "error": null
            }
        }"#;

        let response: ChartResponse = serde_json::from_str(json).unwrap();
        let data = &response.chart.result.unwrap()[0];

        assert_eq!(data.meta.display_name(), Some("Microsoft Corporation"));
        assert_eq!(data.indicators.quote[0].close[1], None);
        assert_eq!(data.indicators.adjclose[0].adjclose[0], Some(368.95));

        let date = trading_date(data.timestamp.as_ref().unwrap()[0], data.meta.gmtoffset);
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 2));
    }

    #[test]
    fn test_parse_not_found_error() {
        let json = r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(json).unwrap();

        assert!(response.chart.error.unwrap().is_not_found());
    }
}
