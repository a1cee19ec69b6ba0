use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::external::PriceProviderError;

#[derive(Debug, Clone)]
pub struct FailureInfo {
    pub failed_at: DateTime<Utc>,
    pub kind: FailureKind,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Ticker is unknown to the provider
    NotFound,
    /// Temporary rate limit
    RateLimited,
    /// Any other provider failure
    Upstream,
}

impl FailureKind {
    pub fn from_error(err: &PriceProviderError) -> Self {
        match err {
            PriceProviderError::RateLimited => FailureKind::RateLimited,
            PriceProviderError::BadResponse(_) => FailureKind::NotFound,
            _ => FailureKind::Upstream,
        }
    }
}

/// Thread-safe cache of tickers whose history fetch recently failed.
///
/// The correlation builder re-requests the same tickers once per pair; this
/// keeps a known-bad ticker from being hammered within one analysis pass or
/// across passes in the same process.
#[derive(Clone, Default)]
pub struct FailureCache {
    cache: Arc<DashMap<String, FailureInfo>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a ticker has a still-valid recorded failure. Expired entries
    /// are evicted on read.
    pub fn is_failed(&self, ticker: &str) -> Option<FailureInfo> {
        if let Some(entry) = self.cache.get(ticker) {
            let info = entry.value().clone();
            let expiry = info.failed_at + Duration::hours(info.ttl_hours);
            if Utc::now() < expiry {
                return Some(info);
            }
            drop(entry);
            self.cache.remove(ticker);
        }
        None
    }

    pub fn record_failure(&self, ticker: &str, kind: FailureKind) {
        let ttl_hours = match kind {
            FailureKind::NotFound => 24,
            FailureKind::RateLimited => 1,
            FailureKind::Upstream => 6,
        };
        self.cache.insert(
            ticker.to_string(),
            FailureInfo {
                failed_at: Utc::now(),
                kind,
                ttl_hours,
            },
        );
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reports_failures() {
        let cache = FailureCache::new();
        assert!(cache.is_failed("TCS").is_none());

        cache.record_failure("TCS", FailureKind::NotFound);
        let info = cache.is_failed("TCS").expect("failure should be cached");
        assert_eq!(info.kind, FailureKind::NotFound);
        assert_eq!(info.ttl_hours, 24);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = FailureCache::new();
        cache.record_failure("INFY", FailureKind::Upstream);
        cache.clear();
        assert!(cache.is_failed("INFY").is_none());
    }
}
