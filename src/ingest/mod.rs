//! Statement and trade-ledger ingestion: upload gating, grid decoding,
//! table discovery, and chunked row extraction.

pub mod chunked;
pub mod reader;
pub mod statement;
pub mod transactions;
pub mod validate;

pub use chunked::CancelToken;
pub use reader::{read_grid, RawGrid};
pub use statement::{IngestReport, StatementIngestor};
pub use transactions::{parse_transactions, TransactionReport};
pub use validate::{file_kind, validate_row_count, validate_upload, FileKind};
