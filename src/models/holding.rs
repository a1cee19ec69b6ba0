use serde::{Deserialize, Serialize};

/// A portfolio position aggregated to one ticker.
///
/// Monetary fields are in the statement's currency. `risk` and
/// `annual_return` are fractions (0.25 for 25%), filled in by the risk
/// engine. A holding whose price data could not be fetched carries `error`
/// and has `risk`/`annual_return` absent, never zero-filled; its market
/// fields fall back to cost basis so portfolio totals stay complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub ticker: String,
    pub name: String,
    pub quantity: f64,
    pub avg_price: f64,
    pub invested_amount: f64,
    pub current_price: f64,
    pub current_value: f64,
    #[serde(rename = "totalPL")]
    pub total_pl: f64,
    #[serde(rename = "totalPLPercent")]
    pub total_pl_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Annualized volatility of daily returns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<f64>,
    /// Annualized return derived from daily returns.
    #[serde(rename = "return", skip_serializing_if = "Option::is_none")]
    pub annual_return: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Holding {
    pub fn new(
        ticker: impl Into<String>,
        name: impl Into<String>,
        quantity: f64,
        avg_price: f64,
        sector: Option<String>,
    ) -> Self {
        let ticker = ticker.into();
        let name = name.into();
        let invested_amount = quantity.max(0.0) * avg_price.max(0.0);
        Self {
            ticker,
            name,
            quantity,
            avg_price,
            invested_amount,
            current_price: 0.0,
            current_value: 0.0,
            total_pl: 0.0,
            total_pl_percent: 0.0,
            sector,
            risk: None,
            annual_return: None,
            error: None,
        }
    }

    /// A holding must have a positive quantity and cost basis to take part
    /// in analytics.
    pub fn is_valid(&self) -> bool {
        self.quantity > 0.0 && self.avg_price > 0.0
    }

    /// Whether this holding contributes to risk aggregation. Error-marked
    /// holdings and holdings without a usable volatility are excluded.
    pub fn has_risk_data(&self) -> bool {
        self.error.is_none() && self.risk.map_or(false, |r| r > 0.0)
    }
}
