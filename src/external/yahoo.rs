use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;

use crate::external::price_provider::{PriceBar, PriceHistory, PriceProvider, PriceProviderError};

/// Daily-history provider backed by the Yahoo v8 chart endpoint.
pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize, Default)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn daily_history(
        &self,
        ticker: &str,
        from_unix: i64,
        to_unix: i64,
    ) -> Result<PriceHistory, PriceProviderError> {
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{ticker}?period1={from_unix}&period2={to_unix}&interval=1d"
        );

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!(
                "status {}",
                resp.status()
            )));
        }

        let body = resp
            .json::<ChartResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        let result = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| PriceProviderError::BadResponse("missing result".into()))?;

        let timestamps = result
            .timestamp
            .ok_or_else(|| PriceProviderError::BadResponse("missing timestamps".into()))?;
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| PriceProviderError::BadResponse("missing quote block".into()))?;

        // timestamps align with the quote arrays by index; bars with a
        // missing close are skipped
        let mut data = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let close = match quote.close.get(i).copied().flatten() {
                Some(c) => c,
                None => continue,
            };
            let date = match DateTime::from_timestamp(*ts, 0) {
                Some(dt) => dt.date_naive(),
                None => continue,
            };
            data.push(PriceBar {
                date,
                open: quote.open.get(i).copied().flatten().unwrap_or(close),
                high: quote.high.get(i).copied().flatten().unwrap_or(close),
                low: quote.low.get(i).copied().flatten().unwrap_or(close),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
            });
        }

        Ok(PriceHistory {
            data,
            is_mock: false,
        })
    }
}
