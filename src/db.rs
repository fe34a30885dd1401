use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, TaxdocError};
use crate::models::{Document, DocumentStatus};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    document_type TEXT NOT NULL DEFAULT 'bank_statement',
    file_name TEXT NOT NULL,
    file_path TEXT NOT NULL,
    file_size INTEGER NOT NULL DEFAULT 0,
    mime_type TEXT NOT NULL DEFAULT 'application/octet-stream',
    checksum TEXT,
    processing_status TEXT NOT NULL DEFAULT 'pending',
    error_message TEXT,
    extracted_count INTEGER,
    processed_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    document_id INTEGER,
    transaction_type TEXT NOT NULL,
    category TEXT NOT NULL,
    amount REAL NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    transaction_date TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'bank_statement',
    is_tax_deductible INTEGER NOT NULL DEFAULT 0,
    is_tax_applicable INTEGER NOT NULL DEFAULT 0,
    extracted_from TEXT,
    raw_source TEXT,
    reference TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (document_id) REFERENCES documents(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_equivalence
    ON transactions(account_id, transaction_date, amount, description);
CREATE INDEX IF NOT EXISTS idx_transactions_document
    ON transactions(document_id);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn find_account(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM accounts WHERE name = ?1", [name], |row| {
        row.get(0)
    })
    .map_err(|_| TaxdocError::UnknownAccount(name.to_string()))
}

pub struct NewDocument<'a> {
    pub account_id: i64,
    pub document_type: &'a str,
    pub file_name: &'a str,
    pub file_path: &'a str,
    pub file_size: i64,
    pub mime_type: &'a str,
    pub checksum: Option<&'a str>,
}

pub fn insert_document(conn: &Connection, doc: &NewDocument) -> Result<i64> {
    conn.execute(
        "INSERT INTO documents (account_id, document_type, file_name, file_path, file_size, mime_type, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            doc.account_id,
            doc.document_type,
            doc.file_name,
            doc.file_path,
            doc.file_size,
            doc.mime_type,
            doc.checksum,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_document(conn: &Connection, id: i64) -> Result<Document> {
    let doc = conn
        .query_row(
            "SELECT id, account_id, document_type, file_name, file_path, file_size, mime_type, \
             checksum, processing_status, error_message, extracted_count, processed_at \
             FROM documents WHERE id = ?1",
            [id],
            |row| {
                let status: String = row.get(8)?;
                Ok(Document {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    document_type: row.get(2)?,
                    file_name: row.get(3)?,
                    file_path: row.get(4)?,
                    file_size: row.get(5)?,
                    mime_type: row.get(6)?,
                    checksum: row.get(7)?,
                    status: DocumentStatus::parse(&status).unwrap_or(DocumentStatus::Pending),
                    error_message: row.get(9)?,
                    extracted_count: row.get(10)?,
                    processed_at: row.get(11)?,
                })
            },
        )
        .optional()?;
    doc.ok_or(TaxdocError::DocumentNotFound(id))
}

/// Atomically transition a document into `processing`, clearing any prior
/// outcome. The status check and the write are a single UPDATE so two
/// concurrent callers cannot both claim the same document.
pub fn claim_for_processing(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE documents SET processing_status = 'processing', error_message = NULL, \
         extracted_count = NULL, processed_at = NULL \
         WHERE id = ?1 AND processing_status != 'processing'",
        [id],
    )?;
    if changed == 1 {
        return Ok(());
    }
    let mut stmt = conn.prepare("SELECT 1 FROM documents WHERE id = ?1")?;
    let exists = stmt.exists([id])?;
    if exists {
        Err(TaxdocError::AlreadyProcessing(id))
    } else {
        Err(TaxdocError::DocumentNotFound(id))
    }
}

pub fn mark_completed(conn: &Connection, id: i64, extracted_count: i64) -> Result<()> {
    let processed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    conn.execute(
        "UPDATE documents SET processing_status = 'completed', error_message = NULL, \
         extracted_count = ?2, processed_at = ?3 WHERE id = ?1",
        rusqlite::params![id, extracted_count, processed_at],
    )?;
    Ok(())
}

pub fn mark_failed(conn: &Connection, id: i64, message: &str) -> Result<()> {
    conn.execute(
        "UPDATE documents SET processing_status = 'failed', error_message = ?2, \
         extracted_count = NULL, processed_at = NULL WHERE id = ?1",
        rusqlite::params![id, message],
    )?;
    Ok(())
}
