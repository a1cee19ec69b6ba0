use crate::config::ImportLimits;
use crate::errors::IngestError;

const CSV_MIME_TYPES: &[&str] = &["text/csv", "application/csv"];
const WORKBOOK_MIME_TYPES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", // .xlsx
    "application/vnd.ms-excel",                                          // .xls
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Workbook,
}

pub fn file_kind(file_name: &str) -> Option<FileKind> {
    let ext = file_name.rsplit('.').next()?.to_lowercase();
    match ext.as_str() {
        "csv" => Some(FileKind::Csv),
        "xlsx" | "xls" => Some(FileKind::Workbook),
        _ => None,
    }
}

/// Gate an upload on extension, declared MIME type, and size before any
/// parsing work happens. Browsers sometimes omit the MIME type, so an empty
/// one is accepted as long as the extension checks out.
pub fn validate_upload(
    file_name: &str,
    mime: Option<&str>,
    size_bytes: u64,
    limits: &ImportLimits,
) -> Result<FileKind, IngestError> {
    let kind = file_kind(file_name).ok_or_else(|| {
        IngestError::Validation(format!(
            "Invalid file type for {file_name}. Supported formats: .csv, .xlsx, .xls"
        ))
    })?;

    if let Some(mime) = mime.map(str::trim).filter(|m| !m.is_empty()) {
        let allowed = match kind {
            FileKind::Csv => CSV_MIME_TYPES,
            FileKind::Workbook => WORKBOOK_MIME_TYPES,
        };
        if !allowed.contains(&mime.to_lowercase().as_str()) {
            return Err(IngestError::Validation(format!(
                "Invalid file type. Expected CSV or Excel file, got: {mime}"
            )));
        }
    }

    let max_bytes = match kind {
        FileKind::Csv => limits.csv_max_bytes,
        FileKind::Workbook => limits.workbook_max_bytes,
    };
    if size_bytes > max_bytes {
        return Err(IngestError::Validation(format!(
            "File too large. Maximum size: {}MB, your file: {:.1}MB",
            max_bytes / (1024 * 1024),
            size_bytes as f64 / (1024.0 * 1024.0)
        )));
    }

    Ok(kind)
}

pub fn validate_row_count(row_count: usize, limits: &ImportLimits) -> Result<(), IngestError> {
    if row_count < limits.min_rows {
        return Err(IngestError::Validation(format!(
            "Too few rows. Minimum: {}, your file has: {row_count}",
            limits.min_rows
        )));
    }
    if row_count > limits.max_rows {
        return Err(IngestError::Validation(format!(
            "Too many rows. Maximum: {}, your file has: {row_count}",
            limits.max_rows
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_kind_from_extension() {
        assert_eq!(file_kind("holdings.CSV"), Some(FileKind::Csv));
        assert_eq!(file_kind("statement.xlsx"), Some(FileKind::Workbook));
        assert_eq!(file_kind("statement.xls"), Some(FileKind::Workbook));
        assert_eq!(file_kind("report.pdf"), None);
        assert_eq!(file_kind("noextension"), None);
    }

    #[test]
    fn rejects_unknown_extension() {
        let limits = ImportLimits::default();
        let err = validate_upload("report.pdf", None, 100, &limits).unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn rejects_mismatched_mime() {
        let limits = ImportLimits::default();
        let err = validate_upload("data.csv", Some("application/pdf"), 100, &limits).unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn empty_mime_is_accepted() {
        let limits = ImportLimits::default();
        assert!(validate_upload("data.csv", Some(""), 100, &limits).is_ok());
        assert!(validate_upload("data.csv", None, 100, &limits).is_ok());
    }

    #[test]
    fn csv_and_workbook_have_different_ceilings() {
        let limits = ImportLimits::default();
        let six_mb = 6 * 1024 * 1024;
        assert!(validate_upload("data.csv", None, six_mb, &limits).is_err());
        assert!(validate_upload("data.xlsx", None, six_mb, &limits).is_ok());
    }

    #[test]
    fn row_count_bounds() {
        let limits = ImportLimits::default();
        assert!(validate_row_count(4, &limits).is_err());
        assert!(validate_row_count(5, &limits).is_ok());
        assert!(validate_row_count(50_000, &limits).is_ok());
        assert!(validate_row_count(50_001, &limits).is_err());
    }
}
