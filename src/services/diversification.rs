use crate::models::{CorrelationPair, SectorBucket};

/// Score portfolio diversification on a 0..100 scale.
///
/// Half the score rewards sector spread (count of sectors, penalized by the
/// weight of the largest one), half rewards low measured correlation: the
/// mean |ρ| across the computed pairs, treated as zero when no pairs could
/// be computed. An empty or worthless portfolio scores zero.
pub fn diversification_score(sectors: &[SectorBucket], pairs: &[CorrelationPair]) -> u8 {
    if sectors.is_empty() || sectors.iter().all(|s| s.total_value <= 0.0) {
        return 0;
    }

    let sector_count = sectors.len() as f64;
    let max_pct = sectors
        .iter()
        .fold(0.0f64, |acc, s| acc.max(s.percentage));
    let sector_component =
        (sector_count * 5.0 + (50.0 - max_pct * 0.5)).clamp(0.0, 50.0);

    let avg_rho = if pairs.is_empty() {
        0.0
    } else {
        pairs.iter().map(|p| p.correlation.abs()).sum::<f64>() / pairs.len() as f64
    };
    let correlation_component = (50.0 - avg_rho * 50.0).max(0.0);

    (sector_component + correlation_component)
        .round()
        .clamp(0.0, 100.0) as u8
}
