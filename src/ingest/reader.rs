use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;

use crate::errors::IngestError;
use crate::ingest::validate::FileKind;

/// A rectangular grid of raw cell values with no column semantics attached.
pub type RawGrid = Vec<Vec<String>>;

/// Decode an upload into a raw grid. Delimited text drops fully blank lines
/// (they carry no structure in CSV); workbook grids keep blank rows because
/// they delimit statement sections.
pub fn read_grid(kind: FileKind, bytes: &[u8]) -> Result<RawGrid, IngestError> {
    match kind {
        FileKind::Csv => read_delimited(bytes),
        FileKind::Workbook => read_workbook(bytes),
    }
}

fn read_delimited(bytes: &[u8]) -> Result<RawGrid, IngestError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Read(e.to_string()))?;
        let row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
        if row.iter().any(|c| !c.is_empty()) {
            grid.push(row);
        }
    }
    Ok(grid)
}

fn read_workbook(bytes: &[u8]) -> Result<RawGrid, IngestError> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| IngestError::Read(format!("workbook open failed: {e}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Read("workbook has no sheets".to_string()))?
        .map_err(|e| IngestError::Read(format!("sheet read failed: {e}")))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => trim_float(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => trim_float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

// Render 12.0 as "12" so whole-number cells parse like their CSV twins.
fn trim_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
