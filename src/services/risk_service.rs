use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::external::{PriceHistory, PriceProvider};
use crate::models::{Holding, PortfolioMetrics, PortfolioPoint, RiskLevel};
use crate::services::failure_cache::{FailureCache, FailureKind};

const TRADING_DAYS: f64 = 252.0;

/// Annualized return and volatility derived from a daily close series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldingStats {
    pub annual_return: f64,
    pub volatility: f64,
}

/// Compute annualized stats from daily closes. Returns `None` when fewer
/// than two usable closes remain after filtering.
///
/// Volatility is the population standard deviation of daily returns scaled
/// by sqrt(252); the daily mean used for the deviations is the annualized
/// return divided back down.
pub fn annualized_stats(closes: &[f64]) -> Option<HoldingStats> {
    let usable: Vec<f64> = closes
        .iter()
        .copied()
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect();

    let returns: Vec<f64> = usable
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .filter(|r| r.is_finite())
        .collect();
    if returns.is_empty() {
        return None;
    }

    let n = returns.len() as f64;
    let annual_return = returns.iter().sum::<f64>() / n * TRADING_DAYS;
    let daily_mean = annual_return / TRADING_DAYS;
    let variance = returns.iter().map(|r| (r - daily_mean).powi(2)).sum::<f64>() / n;
    let volatility = (variance * TRADING_DAYS).sqrt();

    Some(HoldingStats {
        annual_return,
        volatility,
    })
}

/// Excess return per unit of volatility; zero when volatility is zero.
pub fn sharpe_ratio(annual_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility == 0.0 {
        0.0
    } else {
        (annual_return - risk_free_rate) / volatility
    }
}

/// Crude drawdown estimate: scales volatility by a factor that shrinks as
/// the portfolio gains holdings, saturating at ten.
pub fn max_drawdown_estimate(volatility: f64, holding_count: usize) -> f64 {
    let factor = (holding_count as f64 / 10.0).sqrt().min(1.0);
    volatility * (2.5 - factor)
}

/// Pairwise correlation assumption used when no return series is available:
/// same sector 0.7, both in a highly connected sector 0.6, otherwise 0.3.
pub(crate) fn sector_correlation(a: &str, b: &str) -> f64 {
    const CONNECTED: [&str; 3] = ["Financials", "IT", "Healthcare"];
    if a == b {
        0.7
    } else if CONNECTED.contains(&a) && CONNECTED.contains(&b) {
        0.6
    } else {
        0.3
    }
}

/// Enriches holdings with market data and computes portfolio-level risk.
pub struct RiskService {
    provider: Arc<dyn PriceProvider>,
    failures: FailureCache,
    config: AnalysisConfig,
}

impl RiskService {
    pub fn new(
        provider: Arc<dyn PriceProvider>,
        config: AnalysisConfig,
        failures: FailureCache,
    ) -> Self {
        Self {
            provider,
            failures,
            config,
        }
    }

    /// Fetch a year of daily history for every valid holding concurrently
    /// and fill in current price, P&L, and risk stats.
    ///
    /// A holding whose data cannot be fetched is kept, priced at cost with
    /// zero P&L and the failure recorded in its `error` field. Fetched
    /// histories are returned keyed by ticker for downstream reuse.
    pub async fn enrich_holdings(
        &self,
        holdings: &mut [Holding],
    ) -> HashMap<String, PriceHistory> {
        let to = Utc::now().timestamp();
        let from = to - self.config.history_days * 86_400;

        let fetches = holdings.iter().map(|h| {
            let ticker = h.ticker.clone();
            let valid = h.is_valid();
            async move {
                if !valid {
                    return None;
                }
                if self.failures.is_failed(&ticker).is_some() {
                    return Some(Err("market data temporarily unavailable".to_string()));
                }
                match self.provider.daily_history(&ticker, from, to).await {
                    Ok(history) => Some(Ok(history)),
                    Err(e) => {
                        warn!(ticker = %ticker, error = %e, "price fetch failed");
                        self.failures
                            .record_failure(&ticker, FailureKind::from_error(&e));
                        Some(Err(e.to_string()))
                    }
                }
            }
        });
        let results = join_all(fetches).await;

        let mut histories = HashMap::new();
        for (holding, result) in holdings.iter_mut().zip(results) {
            match result {
                None => {}
                Some(Ok(history)) => {
                    let closes = history.closes();
                    if closes.len() < 2 {
                        mark_unavailable(holding, "insufficient price history");
                        continue;
                    }
                    apply_market_data(holding, &closes);
                    histories.insert(holding.ticker.clone(), history);
                }
                Some(Err(msg)) => mark_unavailable(holding, &msg),
            }
        }

        let failed = holdings.iter().filter(|h| h.error.is_some()).count();
        info!(
            enriched = histories.len(),
            failed, "holdings enriched with market data"
        );
        histories
    }

    /// Portfolio-level metrics in percent units (Sharpe excepted).
    ///
    /// Weights use the full portfolio value as denominator, so holdings
    /// without risk data dilute the weighted sums rather than being
    /// renormalized away. Variance combines per-holding volatilities
    /// through the sector correlation assumption.
    pub fn portfolio_metrics(&self, holdings: &[Holding]) -> PortfolioMetrics {
        let total_value: f64 = holdings.iter().map(|h| h.current_value).sum();
        let rated: Vec<&Holding> = holdings.iter().filter(|h| h.has_risk_data()).collect();

        if total_value <= 0.0 || rated.is_empty() {
            return PortfolioMetrics::default();
        }

        let weight = |h: &Holding| h.current_value / total_value;
        let annual_return: f64 = rated
            .iter()
            .map(|h| weight(h) * h.annual_return.unwrap_or(0.0))
            .sum();

        let variance = if rated.len() == 1 {
            let h = rated[0];
            (weight(h) * h.risk.unwrap_or(0.0)).powi(2)
        } else {
            let mut acc = 0.0;
            for (i, a) in rated.iter().enumerate() {
                for (j, b) in rated.iter().enumerate() {
                    let rho = if i == j {
                        1.0
                    } else {
                        sector_correlation(
                            a.sector.as_deref().unwrap_or("Other"),
                            b.sector.as_deref().unwrap_or("Other"),
                        )
                    };
                    acc += weight(a)
                        * weight(b)
                        * a.risk.unwrap_or(0.0)
                        * b.risk.unwrap_or(0.0)
                        * rho;
                }
            }
            acc
        };

        let volatility = variance.max(0.0).sqrt();
        let sharpe = sharpe_ratio(annual_return, volatility, self.config.risk_free_rate);
        let max_drawdown = max_drawdown_estimate(volatility, rated.len());

        PortfolioMetrics {
            annual_return: annual_return * 100.0,
            volatility: volatility * 100.0,
            sharpe_ratio: sharpe,
            max_drawdown: max_drawdown * 100.0,
        }
    }

    pub fn risk_level(&self, metrics: &PortfolioMetrics) -> RiskLevel {
        RiskLevel::from_volatility(metrics.volatility / 100.0)
    }

    /// Build a fixed-length portfolio value series ending today.
    ///
    /// When a real (non-mock) history is available for some holding, its
    /// recent shape is reused, with daily moves rescaled to the portfolio's
    /// own volatility. Otherwise the P&L is spread linearly from invested
    /// to current value; a portfolio with no value flattens to invested.
    pub fn value_history(
        &self,
        holdings: &[Holding],
        histories: &HashMap<String, PriceHistory>,
        metrics: &PortfolioMetrics,
    ) -> Vec<PortfolioPoint> {
        let points = self.config.history_points;
        let invested: f64 = holdings.iter().map(|h| h.invested_amount).sum();
        let current: f64 = holdings.iter().map(|h| h.current_value).sum();
        let today = Utc::now().date_naive();
        let date_at =
            |i: usize| today - Duration::days((points - 1 - i) as i64);

        let template = holdings.iter().find_map(|h| {
            let history = histories.get(&h.ticker)?;
            if history.is_mock {
                return None;
            }
            let closes = history.closes();
            (closes.len() >= 2).then_some(closes)
        });

        if let (Some(closes), true) = (template, current > 0.0) {
            let window: Vec<f64> = closes
                .iter()
                .rev()
                .take(points)
                .rev()
                .copied()
                .collect();
            let last = window[window.len() - 1];
            let scale = metrics.volatility / 100.0 / 0.2;
            let mut series: Vec<PortfolioPoint> = window
                .iter()
                .map(|close| {
                    let relative = close / last - 1.0;
                    (current * (1.0 + relative * scale)).max(0.0)
                })
                .enumerate()
                .map(|(i, value)| PortfolioPoint {
                    date: date_at(i + points.saturating_sub(window.len())),
                    value,
                })
                .collect();
            // pad short windows by holding the earliest value flat
            while series.len() < points {
                let first = &series[0];
                let pad = PortfolioPoint {
                    date: first.date - Duration::days(1),
                    value: first.value,
                };
                series.insert(0, pad);
            }
            return series;
        }

        if current > 0.0 {
            return (0..points)
                .map(|i| {
                    let t = i as f64 / (points - 1) as f64;
                    PortfolioPoint {
                        date: date_at(i),
                        value: (invested + (current - invested) * t).max(0.0),
                    }
                })
                .collect();
        }

        (0..points)
            .map(|i| PortfolioPoint {
                date: date_at(i),
                value: invested.max(0.0),
            })
            .collect()
    }
}

fn apply_market_data(holding: &mut Holding, closes: &[f64]) {
    let last = closes[closes.len() - 1];
    holding.current_price = last;
    holding.current_value = last * holding.quantity;
    holding.total_pl = holding.current_value - holding.invested_amount;
    holding.total_pl_percent = if holding.invested_amount > 0.0 {
        holding.total_pl / holding.invested_amount * 100.0
    } else {
        0.0
    };

    if let Some(stats) = annualized_stats(closes) {
        holding.risk = Some(stats.volatility);
        holding.annual_return = Some(stats.annual_return);
    }
}

/// Price the holding at cost and record why live data is missing. Such a
/// holding still counts toward portfolio totals.
fn mark_unavailable(holding: &mut Holding, reason: &str) {
    holding.current_price = holding.avg_price;
    holding.current_value = holding.invested_amount;
    holding.total_pl = 0.0;
    holding.total_pl_percent = 0.0;
    holding.risk = None;
    holding.annual_return = None;
    holding.error = Some(reason.to_string());
}
