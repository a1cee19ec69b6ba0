mod analysis;
mod holding;
mod risk;
mod sector;
mod transaction;

pub use analysis::{PortfolioAnalysis, PortfolioMetrics, PortfolioPoint};
pub use holding::Holding;
pub use risk::{CorrelationPair, RiskLevel, Significance};
pub use sector::SectorBucket;
pub use transaction::{Transaction, TxSide};
