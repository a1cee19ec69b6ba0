use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::info;

use crate::models::{Holding, SectorBucket};

lazy_static! {
    /// NSE large-cap tickers mapped to their sector. Covers the names that
    /// dominate retail broker statements; everything else falls back to the
    /// name heuristic.
    static ref TICKER_SECTOR: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // IT
        for t in ["TCS", "INFY", "WIPRO", "HCLTECH", "TECHM", "LTIM", "MPHASIS", "COFORGE"] {
            m.insert(t, "IT");
        }
        // Financials
        for t in [
            "HDFCBANK", "ICICIBANK", "SBIN", "KOTAKBANK", "AXISBANK", "INDUSINDBK",
            "BAJFINANCE", "BAJAJFINSV", "HDFCLIFE", "SBILIFE", "ICICIPRULI", "PNB",
        ] {
            m.insert(t, "Financials");
        }
        // Healthcare
        for t in ["SUNPHARMA", "DRREDDY", "CIPLA", "DIVISLAB", "APOLLOHOSP", "LUPIN", "BIOCON"] {
            m.insert(t, "Healthcare");
        }
        // Energy
        for t in [
            "RELIANCE", "ONGC", "NTPC", "POWERGRID", "COALINDIA", "BPCL", "IOC",
            "GAIL", "TATAPOWER", "ADANIGREEN",
        ] {
            m.insert(t, "Energy");
        }
        // Consumer Staples
        for t in [
            "HINDUNILVR", "ITC", "NESTLEIND", "BRITANNIA", "DABUR", "GODREJCP", "TATACONSUM",
        ] {
            m.insert(t, "Consumer Staples");
        }
        // Automobile
        for t in ["MARUTI", "TATAMOTORS", "M&M", "BAJAJ-AUTO", "HEROMOTOCO", "EICHERMOT"] {
            m.insert(t, "Automobile");
        }
        // Metals
        for t in ["TATASTEEL", "JSWSTEEL", "HINDALCO", "VEDL", "NMDC", "SAIL"] {
            m.insert(t, "Metals");
        }
        // Infrastructure
        for t in ["LT", "ULTRACEMCO", "GRASIM", "SHREECEM", "ACC", "AMBUJACEM", "ADANIPORTS"] {
            m.insert(t, "Infrastructure");
        }
        // Telecom
        for t in ["BHARTIARTL", "IDEA", "INDUSTOWER"] {
            m.insert(t, "Telecom");
        }
        // Consumer Discretionary
        for t in ["TITAN", "ASIANPAINT", "DMART", "TRENT", "PAGEIND", "HAVELLS"] {
            m.insert(t, "Consumer Discretionary");
        }
        m
    };
}

/// Keyword fragments matched against a company name, first hit wins.
const NAME_KEYWORDS: &[(&str, &str)] = &[
    ("BANK", "Financials"),
    ("FINANCE", "Financials"),
    ("FINANCIAL", "Financials"),
    ("FIN", "Financials"),
    ("TECH", "IT"),
    ("SOFT", "IT"),
    ("INFO", "IT"),
    ("PHARMA", "Healthcare"),
    ("HEALTH", "Healthcare"),
    ("LAB", "Healthcare"),
    ("HOSPITAL", "Healthcare"),
    ("MOTOR", "Automobile"),
    ("AUTO", "Automobile"),
    ("STEEL", "Metals"),
    ("METAL", "Metals"),
    ("PETRO", "Energy"),
    ("OIL", "Energy"),
    ("GAS", "Energy"),
    ("POWER", "Energy"),
    ("ENERGY", "Energy"),
    ("CEMENT", "Infrastructure"),
    ("INFRA", "Infrastructure"),
    ("CONSTRUCT", "Infrastructure"),
    ("TELECOM", "Telecom"),
];

pub fn lookup_ticker_sector(ticker: &str) -> Option<&'static str> {
    TICKER_SECTOR.get(ticker.to_uppercase().as_str()).copied()
}

pub fn infer_sector_from_name(name: &str) -> &'static str {
    let upper = name.to_uppercase();
    NAME_KEYWORDS
        .iter()
        .find(|(kw, _)| upper.contains(kw))
        .map(|(_, sector)| *sector)
        .unwrap_or("Other")
}

/// Resolve a holding's sector: an explicit statement value wins, then the
/// ticker table, then the name heuristic.
pub fn resolve_sector(explicit: Option<&str>, ticker: &str, name: &str) -> String {
    if let Some(s) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return s.to_string();
    }
    if let Some(s) = lookup_ticker_sector(ticker) {
        return s.to_string();
    }
    infer_sector_from_name(name).to_string()
}

/// Group holdings into sector buckets sorted by descending portfolio share.
///
/// Averages are plain means over the holdings in the bucket; holdings with
/// no computed risk contribute zero to the volatility mean.
pub fn analyze_by_sector(holdings: &[Holding]) -> Vec<SectorBucket> {
    let total_value: f64 = holdings.iter().map(|h| h.current_value).sum();

    let mut buckets: HashMap<String, Vec<Holding>> = HashMap::new();
    for h in holdings {
        let sector = h.sector.clone().unwrap_or_else(|| "Other".to_string());
        buckets.entry(sector).or_default().push(h.clone());
    }

    let mut sectors: Vec<SectorBucket> = buckets
        .into_iter()
        .map(|(sector, members)| {
            let bucket_value: f64 = members.iter().map(|h| h.current_value).sum();
            let invested: f64 = members.iter().map(|h| h.invested_amount).sum();
            let total_pl: f64 = members.iter().map(|h| h.total_pl).sum();
            let n = members.len() as f64;
            let avg_return =
                members.iter().filter_map(|h| h.annual_return).sum::<f64>() / n * 100.0;
            let avg_volatility =
                members.iter().map(|h| h.risk.unwrap_or(0.0)).sum::<f64>() / n * 100.0;

            SectorBucket {
                sector,
                total_value: bucket_value,
                percentage: if total_value > 0.0 {
                    bucket_value / total_value * 100.0
                } else {
                    0.0
                },
                total_pl,
                total_pl_percent: if invested > 0.0 {
                    total_pl / invested * 100.0
                } else {
                    0.0
                },
                avg_return,
                avg_volatility,
                holdings: members,
            }
        })
        .collect();

    sectors.sort_by(|a, b| {
        b.percentage
            .partial_cmp(&a.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    info!(sectors = sectors.len(), "sector breakdown computed");
    sectors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holding(ticker: &str, sector: &str, value: f64) -> Holding {
        let mut h = Holding::new(
            ticker.to_string(),
            ticker.to_string(),
            1.0,
            value,
            Some(sector.to_string()),
        );
        h.current_price = value;
        h.current_value = value;
        h
    }

    #[test]
    fn ticker_table_covers_large_caps() {
        assert_eq!(lookup_ticker_sector("TCS"), Some("IT"));
        assert_eq!(lookup_ticker_sector("hdfcbank"), Some("Financials"));
        assert_eq!(lookup_ticker_sector("UNKNOWN"), None);
    }

    #[test]
    fn name_heuristic_matches_keywords() {
        assert_eq!(infer_sector_from_name("Karnataka Bank"), "Financials");
        assert_eq!(infer_sector_from_name("Zen Technologies"), "IT");
        assert_eq!(infer_sector_from_name("Aurobindo Pharma"), "Healthcare");
        assert_eq!(infer_sector_from_name("Bluechip Widgets"), "Other");
    }

    #[test]
    fn explicit_sector_wins() {
        assert_eq!(resolve_sector(Some("Energy"), "TCS", "TCS"), "Energy");
        assert_eq!(resolve_sector(Some("  "), "TCS", "TCS"), "IT");
    }

    #[test]
    fn buckets_sorted_by_share() {
        let holdings = vec![
            holding("A", "IT", 100.0),
            holding("B", "Financials", 300.0),
            holding("C", "IT", 100.0),
        ];
        let buckets = analyze_by_sector(&holdings);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].sector, "Financials");
        assert!((buckets[0].percentage - 60.0).abs() < 1e-9);
        assert_eq!(buckets[1].holdings.len(), 2);
    }

    #[test]
    fn empty_portfolio_yields_no_buckets() {
        assert!(analyze_by_sector(&[]).is_empty());
    }
}
