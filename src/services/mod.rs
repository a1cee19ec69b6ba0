//! Portfolio analytics: enrichment, risk, sector, correlation, and
//! diversification services plus ledger aggregation.

pub mod analysis_service;
pub mod correlation_service;
pub mod diversification;
pub mod failure_cache;
pub mod holdings_service;
pub mod risk_service;
pub mod sector_service;

pub use analysis_service::AnalysisService;
pub use correlation_service::{correlation_from_prices, CorrelationService};
pub use diversification::diversification_score;
pub use failure_cache::FailureCache;
pub use holdings_service::aggregate;
pub use risk_service::{annualized_stats, HoldingStats, RiskService};
