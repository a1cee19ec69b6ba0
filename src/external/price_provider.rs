use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A daily history response. Providers may serve synthetic data when the
/// upstream source is down; `is_mock` flags it so callers can lower their
/// confidence, but the series is still treated as usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceHistory {
    pub data: Vec<PriceBar>,
    #[serde(rename = "isMock", default)]
    pub is_mock: bool,
}

impl PriceHistory {
    /// Closing prices usable for return math: positive and finite.
    pub fn closes(&self) -> Vec<f64> {
        self.data
            .iter()
            .map(|bar| bar.close)
            .filter(|c| c.is_finite() && *c > 0.0)
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

/// The external price-history collaborator. One call per ticker; any failure
/// is treated by callers as "no data for ticker" rather than retried.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn daily_history(
        &self,
        ticker: &str,
        from_unix: i64,
        to_unix: i64,
    ) -> Result<PriceHistory, PriceProviderError>;
}
