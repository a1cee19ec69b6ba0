use serde::{Deserialize, Serialize};

/// Risk tier of the whole portfolio, classified from annualized volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `volatility` is a fraction (0.25 for 25% annualized).
    pub fn from_volatility(volatility: f64) -> Self {
        if volatility < 0.15 {
            RiskLevel::Low
        } else if volatility < 0.30 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Strength classification of a pairwise correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Significance {
    Low,
    Medium,
    High,
}

impl Significance {
    pub fn from_correlation(correlation: f64) -> Self {
        let abs = correlation.abs();
        if abs > 0.7 {
            Significance::High
        } else if abs > 0.4 {
            Significance::Medium
        } else {
            Significance::Low
        }
    }
}

/// Pearson correlation of daily returns between two holdings. Pairs are
/// unordered; the builder never emits both (a, b) and (b, a).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
    pub ticker_a: String,
    pub ticker_b: String,
    pub correlation: f64,
    pub significance: Significance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_boundaries() {
        assert_eq!(RiskLevel::from_volatility(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_volatility(0.1499), RiskLevel::Low);
        assert_eq!(RiskLevel::from_volatility(0.15), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_volatility(0.2999), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_volatility(0.30), RiskLevel::High);
    }

    #[test]
    fn significance_uses_absolute_correlation() {
        assert_eq!(Significance::from_correlation(0.71), Significance::High);
        assert_eq!(Significance::from_correlation(-0.71), Significance::High);
        assert_eq!(Significance::from_correlation(0.7), Significance::Medium);
        assert_eq!(Significance::from_correlation(0.41), Significance::Medium);
        assert_eq!(Significance::from_correlation(0.4), Significance::Low);
        assert_eq!(Significance::from_correlation(-0.1), Significance::Low);
    }
}
