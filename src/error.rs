use thiserror::Error;

/// Errors raised by the ingestion pipeline. The `Display` strings double as
/// the human-readable messages mirrored onto `documents.error_message`.
#[derive(Error, Debug)]
pub enum TaxdocError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse PDF: {0}")]
    Pdf(String),

    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    #[error("Document {0} is already being processed")]
    AlreadyProcessing(i64),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, TaxdocError>;
