use std::sync::Arc;

use tracing::info;

use crate::config::AnalysisConfig;
use crate::errors::AnalysisError;
use crate::external::PriceProvider;
use crate::models::{Holding, PortfolioAnalysis};
use crate::services::correlation_service::CorrelationService;
use crate::services::diversification::diversification_score;
use crate::services::failure_cache::FailureCache;
use crate::services::risk_service::RiskService;
use crate::services::sector_service::analyze_by_sector;

/// Runs the full analytics pass over a set of ingested holdings.
pub struct AnalysisService {
    risk: RiskService,
    correlation: CorrelationService,
}

impl AnalysisService {
    pub fn new(provider: Arc<dyn PriceProvider>, config: AnalysisConfig) -> Self {
        // one cache for both services, so a ticker that failed during
        // enrichment is not re-fetched per correlation pair
        let failures = FailureCache::new();
        Self {
            risk: RiskService::new(provider.clone(), config.clone(), failures.clone()),
            correlation: CorrelationService::new(provider, config, failures),
        }
    }

    /// Enrich holdings with market data and assemble the complete portfolio
    /// analysis.
    ///
    /// Holdings with zero quantity or price are dropped before analysis;
    /// if nothing survives the filter, the portfolio cannot be analyzed.
    /// Holdings whose market data cannot be fetched stay in the result,
    /// priced at cost, and surface in `data_warnings`.
    pub async fn analyze(
        &self,
        holdings: Vec<Holding>,
        ingest_warnings: Vec<String>,
    ) -> Result<PortfolioAnalysis, AnalysisError> {
        let mut holdings: Vec<Holding> =
            holdings.into_iter().filter(Holding::is_valid).collect();
        if holdings.is_empty() {
            return Err(AnalysisError::Validation(
                "no holdings with positive quantity and price".to_string(),
            ));
        }
        info!(holdings = holdings.len(), "portfolio analysis started");

        let histories = self.risk.enrich_holdings(&mut holdings).await;

        let metrics = self.risk.portfolio_metrics(&holdings);
        let overall_risk_level = self.risk.risk_level(&metrics);
        let history = self.risk.value_history(&holdings, &histories, &metrics);
        let sector_analysis = analyze_by_sector(&holdings);
        let correlation_matrix = self.correlation.build_matrix(&holdings).await;
        let diversification = diversification_score(&sector_analysis, &correlation_matrix);

        let total_invested: f64 = holdings.iter().map(|h| h.invested_amount).sum();
        let current_value: f64 = holdings.iter().map(|h| h.current_value).sum();
        let total_pl = current_value - total_invested;
        let total_pl_percent = if total_invested > 0.0 {
            total_pl / total_invested * 100.0
        } else {
            0.0
        };

        let mut data_warnings = ingest_warnings;
        data_warnings.extend(
            holdings
                .iter()
                .filter_map(|h| h.error.as_ref().map(|e| format!("{}: {e}", h.ticker))),
        );

        info!(
            current_value,
            total_pl,
            risk = ?overall_risk_level,
            "portfolio analysis complete"
        );
        Ok(PortfolioAnalysis {
            total_invested,
            current_value,
            total_pl,
            total_pl_percent,
            overall_risk_level,
            holdings,
            history,
            metrics,
            sector_analysis,
            correlation_matrix,
            diversification_score: diversification,
            data_warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{PriceBar, PriceHistory, PriceProviderError};
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use std::collections::HashMap;

    struct StubProvider {
        closes: HashMap<String, Vec<f64>>,
    }

    #[async_trait]
    impl PriceProvider for StubProvider {
        async fn daily_history(
            &self,
            ticker: &str,
            _from_unix: i64,
            _to_unix: i64,
        ) -> Result<PriceHistory, PriceProviderError> {
            let closes = self
                .closes
                .get(ticker)
                .ok_or_else(|| PriceProviderError::BadResponse("unknown ticker".to_string()))?;
            let data = closes
                .iter()
                .enumerate()
                .map(|(i, c)| PriceBar {
                    date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                        + Duration::days(i as i64),
                    open: *c,
                    high: *c,
                    low: *c,
                    close: *c,
                    volume: 0.0,
                })
                .collect();
            Ok(PriceHistory {
                data,
                is_mock: false,
            })
        }
    }

    fn service(closes: HashMap<String, Vec<f64>>) -> AnalysisService {
        AnalysisService::new(
            Arc::new(StubProvider { closes }),
            AnalysisConfig::default(),
        )
    }

    fn holding(ticker: &str, quantity: f64, avg_price: f64) -> Holding {
        Holding::new(
            ticker.to_string(),
            ticker.to_string(),
            quantity,
            avg_price,
            Some("IT".to_string()),
        )
    }

    fn ramp(start: f64, step: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start + step * i as f64).collect()
    }

    #[tokio::test]
    async fn rejects_portfolio_without_valid_holdings() {
        let svc = service(HashMap::new());
        let err = svc
            .analyze(vec![holding("TCS", 0.0, 100.0)], Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Validation(_)));
    }

    #[tokio::test]
    async fn assembles_full_analysis() {
        let mut closes = HashMap::new();
        closes.insert("TCS".to_string(), ramp(100.0, 1.0, 40));
        closes.insert("RELIANCE".to_string(), ramp(2000.0, 5.0, 40));
        let svc = service(closes);

        let report = svc
            .analyze(
                vec![holding("TCS", 10.0, 90.0), holding("RELIANCE", 2.0, 1900.0)],
                Vec::new(),
            )
            .await
            .unwrap();

        // last closes: 139 and 2195
        assert!((report.current_value - (1390.0 + 4390.0)).abs() < 1e-9);
        assert!((report.total_invested - (900.0 + 3800.0)).abs() < 1e-9);
        assert!(report.total_pl > 0.0);
        assert_eq!(report.holdings.len(), 2);
        assert_eq!(report.history.len(), 30);
        assert_eq!(report.correlation_matrix.len(), 1);
        assert!(report.diversification_score > 0);
        assert!(report.data_warnings.is_empty());
        assert!(report.metrics.volatility >= 0.0);
    }

    #[tokio::test]
    async fn lockstep_holdings_score_on_sector_spread_alone() {
        // identical return series in two unrelated sectors: the matrix
        // reports rho = 1, so only the sector half of the score survives
        let wobble: Vec<f64> = (0..40)
            .scan(100.0f64, |price, i| {
                *price *= if i % 2 == 0 { 1.01 } else { 0.995 };
                Some(*price)
            })
            .collect();
        let mut closes = HashMap::new();
        closes.insert("ONGC".to_string(), wobble.clone());
        closes.insert("TATASTEEL".to_string(), wobble);
        let svc = service(closes);

        let report = svc
            .analyze(
                vec![
                    Holding::new("ONGC", "ONGC", 10.0, 100.0, Some("Energy".to_string())),
                    Holding::new(
                        "TATASTEEL",
                        "TATASTEEL",
                        10.0,
                        100.0,
                        Some("Metals".to_string()),
                    ),
                ],
                Vec::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.correlation_matrix.len(), 1);
        assert!(report.correlation_matrix[0].correlation > 0.99);
        // 2 sectors at 50% each: 2*5 + (50 - 25) = 35, correlation half 0
        assert_eq!(report.diversification_score, 35);
    }

    #[tokio::test]
    async fn unavailable_tickers_surface_as_warnings() {
        let mut closes = HashMap::new();
        closes.insert("TCS".to_string(), ramp(100.0, 1.0, 40));
        let svc = service(closes);

        let report = svc
            .analyze(
                vec![holding("TCS", 10.0, 90.0), holding("GHOST", 5.0, 50.0)],
                vec!["row 3: skipped X".to_string()],
            )
            .await
            .unwrap();

        // the failed holding stays, priced at cost
        let ghost = report
            .holdings
            .iter()
            .find(|h| h.ticker == "GHOST")
            .unwrap();
        assert_eq!(ghost.current_value, 250.0);
        assert!(ghost.error.is_some());
        assert_eq!(report.correlation_matrix.len(), 0);
        assert_eq!(report.data_warnings.len(), 2);
    }
}
