/// Upload gates applied before any parsing work begins.
#[derive(Debug, Clone)]
pub struct ImportLimits {
    /// Ceiling for delimited text uploads, in bytes.
    pub csv_max_bytes: u64,
    /// Ceiling for spreadsheet uploads, in bytes.
    pub workbook_max_bytes: u64,
    /// Minimum number of rows a statement must contain.
    pub min_rows: usize,
    /// Maximum number of rows a statement may contain.
    pub max_rows: usize,
    /// Rows processed per chunk before yielding and checking cancellation.
    pub chunk_size: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            csv_max_bytes: 5 * 1024 * 1024,
            workbook_max_bytes: 10 * 1024 * 1024,
            min_rows: 5,
            max_rows: 50_000,
            chunk_size: 1_000,
        }
    }
}

impl ImportLimits {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            csv_max_bytes: env_parse("IMPORT_CSV_MAX_BYTES", defaults.csv_max_bytes),
            workbook_max_bytes: env_parse("IMPORT_WORKBOOK_MAX_BYTES", defaults.workbook_max_bytes),
            min_rows: env_parse("IMPORT_MIN_ROWS", defaults.min_rows),
            max_rows: env_parse("IMPORT_MAX_ROWS", defaults.max_rows),
            chunk_size: env_parse("IMPORT_CHUNK_SIZE", defaults.chunk_size),
        }
    }
}

/// Parameters of the analytics pass.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Annual risk-free rate used for the Sharpe ratio (e.g. 0.02 for 2%).
    pub risk_free_rate: f64,
    /// Calendar days of price history fetched per holding.
    pub history_days: i64,
    /// Number of points in the portfolio value history series.
    pub history_points: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.02,
            history_days: 365,
            history_points: 30,
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            risk_free_rate: env_parse("ANALYSIS_RISK_FREE_RATE", defaults.risk_free_rate),
            history_days: env_parse("ANALYSIS_HISTORY_DAYS", defaults.history_days),
            history_points: env_parse("ANALYSIS_HISTORY_POINTS", defaults.history_points),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_product_gates() {
        let limits = ImportLimits::default();
        assert_eq!(limits.csv_max_bytes, 5 * 1024 * 1024);
        assert_eq!(limits.workbook_max_bytes, 10 * 1024 * 1024);
        assert_eq!(limits.min_rows, 5);
        assert_eq!(limits.max_rows, 50_000);
        assert_eq!(limits.chunk_size, 1_000);
    }
}
