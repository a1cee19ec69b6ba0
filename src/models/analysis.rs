use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CorrelationPair, Holding, RiskLevel, SectorBucket};

/// One point of the portfolio value history series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Portfolio-level risk/return metrics. Percent units on the wire:
/// `annual_return`, `volatility`, and `max_drawdown` are percentages,
/// `sharpe_ratio` is a plain ratio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    #[serde(rename = "return")]
    pub annual_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

/// The top-level analytics output. A pure function of the holdings, the
/// fetched price histories, and the risk-free rate; it holds no independent
/// state and is rebuilt from scratch on every pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalysis {
    pub total_invested: f64,
    pub current_value: f64,
    #[serde(rename = "totalPL")]
    pub total_pl: f64,
    #[serde(rename = "totalPLPercent")]
    pub total_pl_percent: f64,
    pub overall_risk_level: RiskLevel,
    pub holdings: Vec<Holding>,
    pub history: Vec<PortfolioPoint>,
    pub metrics: PortfolioMetrics,
    pub sector_analysis: Vec<SectorBucket>,
    pub correlation_matrix: Vec<CorrelationPair>,
    pub diversification_score: u8,
    /// Tickers whose price data was unavailable; the analysis degraded to
    /// cost basis for them instead of failing.
    pub data_warnings: Vec<String>,
}
