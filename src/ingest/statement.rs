use tracing::{debug, info};

use crate::config::ImportLimits;
use crate::errors::IngestError;
use crate::ingest::chunked::{process_in_chunks, CancelToken, Progress};
use crate::ingest::reader::{read_grid, RawGrid};
use crate::ingest::validate::{validate_row_count, validate_upload};
use crate::models::Holding;
use crate::services::sector_service;

/// Markers that open a holdings section in a broker statement.
const SECTION_MARKERS: &[&str] = &[
    "equity holdings",
    "holdings statement",
    "portfolio holdings",
    "stock holdings",
    "unrealised trades",
    "unrealized trades",
    "groww",
    "zerodha",
];

/// Markers that close the holdings table and open the next section.
const NEXT_SECTION_MARKERS: &[&str] = &[
    "realised trades",
    "realized trades",
    "disclaimer",
    "summary",
    "total",
    "grand total",
    "net total",
];

/// Vocabulary a row must touch to be considered a column-header row.
const HEADER_VOCAB: &[&str] = &[
    "symbol", "quantity", "price", "name", "shares", "cost", "average", "ltp", "value",
];

const SYMBOL_CANDIDATES: &[&str] = &[
    "symbol",
    "stock name",
    "name",
    "scrip",
    "company name",
    "instrument",
    "security",
    "stock symbol",
];
const QUANTITY_CANDIDATES: &[&str] = &[
    "quantity available",
    "quantity",
    "qty",
    "shares",
    "units",
    "balance",
    "available quantity",
];
const AVG_PRICE_CANDIDATES: &[&str] = &[
    "average price",
    "avg price",
    "buy price",
    "purchase price",
    "cost price",
    "average cost",
    "avg cost",
    "price",
];
const SECTOR_CANDIDATES: &[&str] = &["sector", "industry", "category", "segment"];
const CURRENT_PRICE_CANDIDATES: &[&str] = &[
    "current price",
    "ltp",
    "last price",
    "market price",
    "closing price",
    "previous closing",
];
const VALUE_CANDIDATES: &[&str] = &["current value", "market value", "total value", "value"];

/// Result of a completed import: the validated holdings plus non-fatal
/// per-row warnings.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub holdings: Vec<Holding>,
    pub warnings: Vec<String>,
}

/// Column indices resolved against a header row. The three required fields
/// must resolve or the candidate header is rejected.
#[derive(Debug, Clone)]
struct ColumnMap {
    symbol: usize,
    quantity: usize,
    avg_price: usize,
    sector: Option<usize>,
    current_price: Option<usize>,
    value: Option<usize>,
}

#[derive(Debug)]
struct TableSpan {
    map: ColumnMap,
    /// First data row (the row after the header).
    start: usize,
    /// One past the last data row.
    end: usize,
}

/// Ingests broker holding statements: locates the holdings table inside a
/// loosely structured grid, maps its columns onto the canonical holding
/// schema, and emits validated holdings.
///
/// Strategies are tried in order, first success wins:
/// 1. section-marker + header discovery,
/// 2. canonical `ticker,name,quantity,avgPrice,...` headers,
/// 3. permissive pattern matching over bare rows.
pub struct StatementIngestor {
    limits: ImportLimits,
}

impl StatementIngestor {
    pub fn new(limits: ImportLimits) -> Self {
        Self { limits }
    }

    pub fn with_defaults() -> Self {
        Self::new(ImportLimits::default())
    }

    /// Gate, decode, and ingest an uploaded statement. All-or-nothing: any
    /// error (including cancellation) commits no holdings.
    pub async fn ingest_file(
        &self,
        file_name: &str,
        mime: Option<&str>,
        bytes: &[u8],
        cancel: &CancelToken,
        on_progress: impl FnMut(u8),
    ) -> Result<IngestReport, IngestError> {
        let kind = validate_upload(file_name, mime, bytes.len() as u64, &self.limits)?;
        let grid = read_grid(kind, bytes)?;
        validate_row_count(grid.len(), &self.limits)?;
        info!(file = file_name, rows = grid.len(), "statement decoded");
        self.ingest_grid(&grid, cancel, on_progress).await
    }

    /// Ingest an already-decoded grid.
    pub async fn ingest_grid(
        &self,
        grid: &RawGrid,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(u8),
    ) -> Result<IngestReport, IngestError> {
        if grid.is_empty() {
            return Err(IngestError::Format("statement is empty".to_string()));
        }

        let mut progress = Progress::new(&mut on_progress);
        let mut warnings = Vec::new();

        // strategy 1: locate a marked holdings section with a header row
        if let Some(span) = find_table(grid) {
            debug!(start = span.start, end = span.end, "holdings section located");
            let rows = &grid[span.start..span.end];
            let map = span.map.clone();
            let holdings = process_in_chunks(
                rows,
                self.limits.chunk_size,
                cancel,
                &mut progress,
                |chunk, offset| {
                    chunk
                        .iter()
                        .enumerate()
                        .filter_map(|(i, row)| {
                            parse_table_row(row, &map, span.start + offset + i + 1, &mut warnings)
                        })
                        .collect()
                },
            )
            .await?;

            if !holdings.is_empty() {
                info!(count = holdings.len(), "ingested via section discovery");
                return Ok(IngestReport { holdings, warnings });
            }
            warnings.push("holdings section contained no valid rows".to_string());
        }

        // strategy 2: canonical export headers, no section discovery needed
        if let Some(map) = canonical_columns(&grid[0]) {
            let rows = &grid[1..];
            let holdings = process_in_chunks(
                rows,
                self.limits.chunk_size,
                cancel,
                &mut progress,
                |chunk, offset| {
                    chunk
                        .iter()
                        .enumerate()
                        .filter_map(|(i, row)| {
                            parse_canonical_row(row, &map, offset + i + 2, &mut warnings)
                        })
                        .collect()
                },
            )
            .await?;

            if !holdings.is_empty() {
                info!(count = holdings.len(), "ingested via canonical headers");
                return Ok(IngestReport { holdings, warnings });
            }
            warnings.push("canonical table contained no valid rows".to_string());
        }

        // strategy 3: last-resort pattern scan over every row
        let holdings = process_in_chunks(
            grid,
            self.limits.chunk_size,
            cancel,
            &mut progress,
            |chunk, _offset| chunk.iter().filter_map(|row| pattern_row(row)).collect(),
        )
        .await?;

        if holdings.is_empty() {
            return Err(IngestError::Format(
                "no holdings recognized after exhausting all parsing strategies".to_string(),
            ));
        }
        info!(count = holdings.len(), "ingested via pattern fallback");
        Ok(IngestReport { holdings, warnings })
    }
}

/// Parse a numeric cell, tolerating thousands separators, currency
/// adornments, and percent signs.
fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '$' | '₹' | '%'))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn row_is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn row_contains_marker(row: &[String], markers: &[&str]) -> bool {
    row.iter().any(|cell| {
        let lower = cell.trim().to_lowercase();
        !lower.is_empty() && markers.iter().any(|m| lower.contains(m))
    })
}

fn find_index(header: &[String], candidates: &[&str]) -> Option<usize> {
    // exact match wins over substring match
    for cand in candidates {
        if let Some(idx) = header.iter().position(|h| h == cand) {
            return Some(idx);
        }
    }
    header
        .iter()
        .position(|h| candidates.iter().any(|c| h.contains(c)))
}

fn resolve_columns(header_row: &[String]) -> Option<ColumnMap> {
    let header: Vec<String> = header_row
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let symbol = find_index(&header, SYMBOL_CANDIDATES)?;
    let quantity = find_index(&header, QUANTITY_CANDIDATES)?;
    let avg_price = find_index(&header, AVG_PRICE_CANDIDATES)?;

    Some(ColumnMap {
        symbol,
        quantity,
        avg_price,
        sector: find_index(&header, SECTOR_CANDIDATES),
        current_price: find_index(&header, CURRENT_PRICE_CANDIDATES),
        value: find_index(&header, VALUE_CANDIDATES),
    })
}

/// Scan for a section marker, then for a usable header row within the next
/// 15 rows, then for the end of the data that follows it.
fn find_table(grid: &RawGrid) -> Option<TableSpan> {
    for (r, row) in grid.iter().enumerate() {
        if !row_contains_marker(row, SECTION_MARKERS) {
            continue;
        }

        let scan_end = (r + 16).min(grid.len());
        for k in (r + 1)..scan_end {
            let header = &grid[k];
            if row_is_blank(header) {
                continue;
            }
            let lower: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
            if !lower
                .iter()
                .any(|c| HEADER_VOCAB.iter().any(|v| c.contains(v)))
            {
                continue;
            }
            // a header candidate missing a required column is rejected and
            // scanning continues
            let Some(map) = resolve_columns(header) else {
                continue;
            };

            let start = k + 1;
            let mut end = start;
            while end < grid.len() {
                let data_row = &grid[end];
                if row_is_blank(data_row) || row_contains_marker(data_row, NEXT_SECTION_MARKERS) {
                    break;
                }
                end += 1;
            }
            return Some(TableSpan { map, start, end });
        }
    }
    None
}

fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn parse_table_row(
    row: &[String],
    map: &ColumnMap,
    line: usize,
    warnings: &mut Vec<String>,
) -> Option<Holding> {
    let symbol = cell(row, map.symbol).trim();
    if symbol.is_empty() {
        return None;
    }

    let quantity = parse_number(cell(row, map.quantity)).unwrap_or(0.0);
    let avg_price = parse_number(cell(row, map.avg_price)).unwrap_or(0.0);
    if quantity <= 0.0 || avg_price <= 0.0 {
        warnings.push(format!(
            "row {line}: skipped {symbol} (non-positive quantity or price)"
        ));
        return None;
    }

    let ticker = symbol.to_uppercase();
    let explicit_sector = map
        .sector
        .map(|i| cell(row, i).trim().to_string())
        .filter(|s| !s.is_empty());
    let sector = sector_service::resolve_sector(explicit_sector.as_deref(), &ticker, &ticker);

    let mut holding = Holding::new(ticker.clone(), ticker, quantity, avg_price, Some(sector));

    let current_price = map
        .current_price
        .and_then(|i| parse_number(cell(row, i)))
        .filter(|p| *p > 0.0)
        .unwrap_or(0.0);
    let current_value = map
        .value
        .and_then(|i| parse_number(cell(row, i)))
        .filter(|v| *v > 0.0)
        .unwrap_or(current_price * quantity);

    if current_value > 0.0 {
        holding.current_price = current_price;
        holding.current_value = current_value;
        holding.total_pl = current_value - holding.invested_amount;
        holding.total_pl_percent = if holding.invested_amount > 0.0 {
            holding.total_pl / holding.invested_amount * 100.0
        } else {
            0.0
        };
    }

    Some(holding)
}

/// Canonical export columns: `ticker,name,quantity,avgPrice,instrument,sector`
/// (case-insensitive, `avg_price` accepted). Exact header matches only.
#[derive(Debug, Clone)]
struct CanonicalMap {
    ticker: usize,
    name: Option<usize>,
    quantity: usize,
    avg_price: usize,
    sector: Option<usize>,
}

fn canonical_columns(header_row: &[String]) -> Option<CanonicalMap> {
    let header: Vec<String> = header_row
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let idx = |key: &str| header.iter().position(|h| h == key);

    Some(CanonicalMap {
        ticker: idx("ticker")?,
        name: idx("name"),
        quantity: idx("quantity")?,
        avg_price: idx("avgprice").or_else(|| idx("avg_price"))?,
        sector: idx("sector"),
    })
}

fn parse_canonical_row(
    row: &[String],
    map: &CanonicalMap,
    line: usize,
    warnings: &mut Vec<String>,
) -> Option<Holding> {
    let ticker = cell(row, map.ticker).trim().to_uppercase();
    if ticker.is_empty() {
        return None;
    }

    let quantity = parse_number(cell(row, map.quantity)).unwrap_or(0.0);
    let avg_price = parse_number(cell(row, map.avg_price)).unwrap_or(0.0);
    if quantity <= 0.0 || avg_price <= 0.0 {
        warnings.push(format!(
            "row {line}: skipped {ticker} (non-positive quantity or price)"
        ));
        return None;
    }

    let name = map
        .name
        .map(|i| cell(row, i).trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| ticker.clone());
    let sector = map
        .sector
        .map(|i| cell(row, i).trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| sector_service::lookup_ticker_sector(&ticker).map(str::to_string))
        .unwrap_or_else(|| "Other".to_string());

    Some(Holding::new(ticker, name, quantity, avg_price, Some(sector)))
}

/// Last-resort row recognizer: at least two parseable positive numbers plus
/// one non-numeric token. The token becomes the symbol, the first number in
/// (0, 10 000) the price, the first whole number in (0, 1 000 000) the
/// quantity. Intentionally permissive.
fn pattern_row(row: &[String]) -> Option<Holding> {
    if row.len() < 3 {
        return None;
    }

    let positive_numbers = row
        .iter()
        .filter(|c| parse_number(c).map_or(false, |n| n > 0.0))
        .count();
    if positive_numbers < 2 {
        return None;
    }

    let mut symbol: Option<&str> = None;
    let mut quantity: Option<f64> = None;
    let mut price: Option<f64> = None;

    for cell in row {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        match parse_number(cell) {
            None => {
                let lower = cell.to_lowercase();
                if symbol.is_none() && !lower.contains("total") && !lower.contains("summary") {
                    symbol = Some(cell);
                }
            }
            Some(n) => {
                if quantity.is_none() && n > 0.0 && n < 1_000_000.0 && n.fract() == 0.0 {
                    quantity = Some(n);
                }
                if price.is_none() && n > 0.0 && n < 10_000.0 {
                    price = Some(n);
                }
            }
        }
    }

    let (symbol, quantity, price) = (symbol?, quantity?, price?);
    let ticker = symbol.to_uppercase();
    let sector = sector_service::resolve_sector(None, &ticker, &ticker);
    Some(Holding::new(
        ticker.clone(),
        ticker,
        quantity,
        price,
        Some(sector),
    ))
}
