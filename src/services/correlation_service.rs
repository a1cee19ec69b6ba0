use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::external::PriceProvider;
use crate::models::{CorrelationPair, Holding, Significance};
use crate::services::failure_cache::{FailureCache, FailureKind};

/// A ticker needs this many usable closes before it can enter the matrix.
const MIN_CLOSES: usize = 10;

fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .iter()
        .copied()
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect::<Vec<f64>>()
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Pearson correlation of the daily returns of two close series, aligned
/// over their trailing overlap. Degenerate inputs (fewer than two return
/// pairs, or a flat series) yield zero.
pub fn correlation_from_prices(a: &[f64], b: &[f64]) -> f64 {
    let ra = daily_returns(a);
    let rb = daily_returns(b);
    let n = ra.len().min(rb.len());
    if n < 2 {
        return 0.0;
    }

    let pairs: Vec<(f64, f64)> = ra[ra.len() - n..]
        .iter()
        .zip(&rb[rb.len() - n..])
        .map(|(x, y)| (*x, *y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return 0.0;
    }

    let count = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(x, _)| x).sum::<f64>() / count;
    let mean_b = pairs.iter().map(|(_, y)| y).sum::<f64>() / count;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        0.0
    } else {
        (cov / denom).clamp(-1.0, 1.0)
    }
}

/// Computes pairwise return correlations across a portfolio.
pub struct CorrelationService {
    provider: Arc<dyn PriceProvider>,
    failures: FailureCache,
    config: AnalysisConfig,
}

impl CorrelationService {
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

    /// Build the upper-triangle correlation matrix for all holdings that
    /// carry live market data. Pairs are fetched concurrently; a pair whose
    /// data cannot be fetched, or whose series is too short, is silently
    /// dropped from the matrix. Tickers with a cached fetch failure are
    /// excluded up front instead of being re-requested once per pair.
    pub async fn build_matrix(&self, holdings: &[Holding]) -> Vec<CorrelationPair> {
        let eligible: Vec<&Holding> = holdings
            .iter()
            .filter(|h| {
                h.is_valid() && h.error.is_none() && self.failures.is_failed(&h.ticker).is_none()
            })
            .collect();
        if eligible.len() < 2 {
            return Vec::new();
        }

        let to = Utc::now().timestamp();
        let from = to - self.config.history_days * 86_400;

        let mut tasks = Vec::new();
        for i in 0..eligible.len() {
            for j in (i + 1)..eligible.len() {
                let a = eligible[i].ticker.clone();
                let b = eligible[j].ticker.clone();
                tasks.push(async move {
                    let (ra, rb) = futures::join!(
                        self.provider.daily_history(&a, from, to),
                        self.provider.daily_history(&b, from, to),
                    );
                    let ha = match ra {
                        Ok(h) => h,
                        Err(e) => {
                            warn!(ticker = %a, error = %e, "correlation fetch failed");
                            self.failures.record_failure(&a, FailureKind::from_error(&e));
                            return None;
                        }
                    };
                    let hb = match rb {
                        Ok(h) => h,
                        Err(e) => {
                            warn!(ticker = %b, error = %e, "correlation fetch failed");
                            self.failures.record_failure(&b, FailureKind::from_error(&e));
                            return None;
                        }
                    };

                    let ca = ha.closes();
                    let cb = hb.closes();
                    if ca.len() < MIN_CLOSES || cb.len() < MIN_CLOSES {
                        return None;
                    }

                    let correlation = correlation_from_prices(&ca, &cb);
                    Some(CorrelationPair {
                        ticker_a: a,
                        ticker_b: b,
                        correlation,
                        significance: Significance::from_correlation(correlation),
                    })
                });
            }
        }

        let matrix: Vec<CorrelationPair> =
            join_all(tasks).await.into_iter().flatten().collect();
        info!(pairs = matrix.len(), "correlation matrix built");
        matrix
    }
}
