use thiserror::Error;

/// Errors raised while importing a holdings statement.
///
/// All variants abort the import as a whole: a statement either ingests
/// completely or not at all.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No recognizable holdings table found: {0}")]
    Format(String),

    #[error("Processing cancelled")]
    Cancelled,

    #[error("Failed to read file: {0}")]
    Read(String),
}

/// Errors raised at the analysis entry point.
///
/// Per-ticker data unavailability is deliberately not represented here; it is
/// recorded on the affected `Holding` via its `error` field and the analysis
/// proceeds best-effort.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Validation error: {0}")]
    Validation(String),
}
