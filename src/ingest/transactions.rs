use chrono::NaiveDate;
use tracing::info;

use crate::errors::IngestError;
use crate::ingest::reader::RawGrid;
use crate::models::{Transaction, TxSide};

const DATE_CANDIDATES: &[&str] = &[
    "date",
    "trade date",
    "transaction date",
    "order date",
    "executed at",
    "timestamp",
];
const SYMBOL_CANDIDATES: &[&str] = &[
    "symbol", "ticker", "scrip", "stock", "instrument", "security", "asset",
];
const SIDE_CANDIDATES: &[&str] = &[
    "type",
    "side",
    "transaction type",
    "action",
    "buy/sell",
    "order type",
    "activity",
];
const QUANTITY_CANDIDATES: &[&str] = &["quantity", "qty", "shares", "units", "filled qty"];
const PRICE_CANDIDATES: &[&str] = &[
    "price",
    "rate",
    "avg price",
    "average price",
    "execution price",
    "trade price",
    "unit price",
];

/// Date layouts seen across broker trade exports, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
];

/// How many leading rows to scan for a mappable header.
const HEADER_SCAN_ROWS: usize = 10;

#[derive(Debug, Default)]
pub struct TransactionReport {
    pub transactions: Vec<Transaction>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
struct TxColumnMap {
    date: usize,
    symbol: usize,
    side: usize,
    quantity: usize,
    price: usize,
}

fn find_index(header: &[String], candidates: &[&str]) -> Option<usize> {
    for cand in candidates {
        if let Some(idx) = header.iter().position(|h| h == cand) {
            return Some(idx);
        }
    }
    header
        .iter()
        .position(|h| candidates.iter().any(|c| h.contains(c)))
}

fn map_columns(header_row: &[String]) -> Option<TxColumnMap> {
    let header: Vec<String> = header_row
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    Some(TxColumnMap {
        date: find_index(&header, DATE_CANDIDATES)?,
        symbol: find_index(&header, SYMBOL_CANDIDATES)?,
        side: find_index(&header, SIDE_CANDIDATES)?,
        quantity: find_index(&header, QUANTITY_CANDIDATES)?,
        price: find_index(&header, PRICE_CANDIDATES)?,
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '$' | '₹' | '%'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn cell<'a>(row: &'a [String], idx: usize) -> &'a str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Parse a trade-ledger grid into transactions. Columns are auto-mapped
/// from the header, rows that fail to parse become warnings rather than
/// aborting the import.
pub fn parse_transactions(grid: &RawGrid) -> Result<TransactionReport, IngestError> {
    let scan_end = HEADER_SCAN_ROWS.min(grid.len());
    let (header_idx, map) = grid[..scan_end]
        .iter()
        .enumerate()
        .find_map(|(i, row)| map_columns(row).map(|m| (i, m)))
        .ok_or_else(|| {
            IngestError::Format(
                "no transaction header found (need date, symbol, type, quantity, price)"
                    .to_string(),
            )
        })?;

    let mut report = TransactionReport::default();
    for (offset, row) in grid[header_idx + 1..].iter().enumerate() {
        let line = header_idx + offset + 2;
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        match parse_row(row, &map) {
            Ok(tx) => report.transactions.push(tx),
            Err(reason) => report.warnings.push(format!("row {line}: {reason}")),
        }
    }

    info!(
        count = report.transactions.len(),
        skipped = report.warnings.len(),
        "transaction ledger parsed"
    );
    Ok(report)
}

fn parse_row(row: &[String], map: &TxColumnMap) -> Result<Transaction, String> {
    let ticker = cell(row, map.symbol).trim();
    if ticker.is_empty() {
        return Err("missing symbol".to_string());
    }

    let side = TxSide::parse(cell(row, map.side))
        .ok_or_else(|| format!("unrecognized side {:?}", cell(row, map.side)))?;
    let date = parse_date(cell(row, map.date))
        .ok_or_else(|| format!("unparseable date {:?}", cell(row, map.date)))?;
    let quantity = parse_number(cell(row, map.quantity))
        .filter(|q| *q > 0.0)
        .ok_or_else(|| format!("invalid quantity {:?}", cell(row, map.quantity)))?;
    let price = parse_number(cell(row, map.price))
        .filter(|p| *p > 0.0)
        .ok_or_else(|| format!("invalid price {:?}", cell(row, map.price)))?;

    Ok(Transaction::new(
        ticker.to_string(),
        ticker.to_string(),
        side,
        quantity,
        price,
        date,
    ))
}
