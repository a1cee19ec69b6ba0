use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxSide {
    Buy,
    Sell,
}

impl TxSide {
    /// Normalize the free-form side tokens brokers export.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "BUY" | "B" | "PURCHASE" | "LONG" => Some(TxSide::Buy),
            "SELL" | "S" | "SALE" | "SHORT" => Some(TxSide::Sell),
            _ => None,
        }
    }
}

/// A buy or sell event affecting one ticker. Transactions are immutable once
/// recorded; holdings are always derived from them, never stored alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub ticker: String,
    pub name: String,
    pub side: TxSide,
    pub quantity: f64,
    pub price: f64,
    pub date: NaiveDate,
}

impl Transaction {
    pub fn new(
        ticker: impl Into<String>,
        name: impl Into<String>,
        side: TxSide,
        quantity: f64,
        price: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into().to_uppercase(),
            name: name.into(),
            side,
            quantity,
            price,
            date,
        }
    }
}
