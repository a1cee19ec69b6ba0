//! Portfolio statement ingestion and risk analytics.
//!
//! Broker statements (CSV or spreadsheet) are gated, decoded into a raw
//! grid, and parsed into holdings through a chain of table-discovery
//! strategies. Holdings are then enriched with daily market data and run
//! through the analytics pass: annualized risk and return, sector
//! breakdown, pairwise correlations, and a diversification score.

pub mod config;
pub mod errors;
pub mod external;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod services;

pub use config::{AnalysisConfig, ImportLimits};
pub use errors::{AnalysisError, IngestError};
pub use ingest::{CancelToken, IngestReport, StatementIngestor};
pub use models::{Holding, PortfolioAnalysis, Transaction, TxSide};
pub use services::AnalysisService;
