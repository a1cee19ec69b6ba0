use serde::{Deserialize, Serialize};

use super::Holding;

/// Aggregate of the holdings sharing one industry classification.
///
/// Recomputed on every analytics pass from the holdings it summarizes;
/// never persisted independently. `avg_return`/`avg_volatility` are simple
/// unweighted means across the sector's holdings, in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorBucket {
    pub sector: String,
    pub total_value: f64,
    /// Share of total portfolio value, 0-100.
    pub percentage: f64,
    #[serde(rename = "totalPL")]
    pub total_pl: f64,
    #[serde(rename = "totalPLPercent")]
    pub total_pl_percent: f64,
    pub avg_return: f64,
    pub avg_volatility: f64,
    pub holdings: Vec<Holding>,
}
