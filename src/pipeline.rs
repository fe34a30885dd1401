use std::path::Path;

use chrono::Datelike;
use rusqlite::Connection;

use crate::classifier::{classify, ClassifierConfig};
use crate::db;
use crate::dedup;
use crate::error::{Result, TaxdocError};
use crate::extractor::{Extraction, SourceFormat};
use crate::models::{
    CandidateRow, ClassifiedTransaction, Document, DocumentStatus, SkippedRow, Transaction,
};
use crate::normalize::{parse_amount, parse_date};
use crate::notifier::Notifier;

#[derive(Debug)]
pub struct ProcessOutcome {
    pub transactions_extracted: usize,
    pub transactions: Vec<Transaction>,
    /// Rows dropped during extraction/normalization, for diagnostics.
    pub skipped_rows: Vec<SkippedRow>,
}

/// Run the full ingestion pipeline for one document: claim it, extract
/// candidate rows for its format, normalize and classify each row, persist
/// through the dedup gate, finalize the document, then hand the affected
/// years to the notifier. Any failure between claim and persistence marks the
/// document `failed` with the error's message and re-raises.
///
/// Safe to re-run on a `completed` or `failed` document; a document already
/// in `processing` is rejected without touching stored state.
pub fn process_document(
    conn: &Connection,
    config: &ClassifierConfig,
    notifier: &Notifier,
    document_id: i64,
) -> Result<ProcessOutcome> {
    let document = db::load_document(conn, document_id)?;
    db::claim_for_processing(conn, document_id)?;

    match run_pipeline(conn, config, &document) {
        Ok((created, skipped)) => {
            db::mark_completed(conn, document_id, created.len() as i64)?;
            log::info!(
                "document {document_id}: {} transactions extracted, {} rows skipped",
                created.len(),
                skipped.len()
            );
            if !created.is_empty() {
                notifier.notify(document.account_id, distinct_years(&created));
            }
            Ok(ProcessOutcome {
                transactions_extracted: created.len(),
                transactions: created,
                skipped_rows: skipped,
            })
        }
        Err(e) => {
            log::warn!("document {document_id}: processing failed: {e}");
            // Best effort: if the failure write itself fails, the original
            // error still wins.
            let _ = db::mark_failed(conn, document_id, &e.to_string());
            Err(e)
        }
    }
}

fn run_pipeline(
    conn: &Connection,
    config: &ClassifierConfig,
    document: &Document,
) -> Result<(Vec<Transaction>, Vec<SkippedRow>)> {
    let format = SourceFormat::detect(&document.file_name, &document.mime_type).ok_or_else(|| {
        let ext = Path::new(&document.file_name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| document.mime_type.clone());
        TaxdocError::UnsupportedFormat(ext)
    })?;

    let Extraction { rows, mut skipped } =
        format.extractor().extract(Path::new(&document.file_path))?;
    let classified = normalize_and_classify(config, format.key(), rows, &mut skipped);
    for skip in &skipped {
        log::debug!("document {}: skipped {} ({})", document.id, skip.source_ref, skip.reason);
    }

    let created = dedup::persist_new(conn, document.account_id, document.id, &classified)?;
    Ok((created, skipped))
}

/// Normalize candidate rows and run the classifier over them. Rows whose date
/// does not parse or whose amount comes out zero are dropped into the skip
/// list; amounts are stored as absolute values, so everything that survives
/// is strictly positive.
fn normalize_and_classify(
    config: &ClassifierConfig,
    extracted_from: &str,
    rows: Vec<CandidateRow>,
    skipped: &mut Vec<SkippedRow>,
) -> Vec<ClassifiedTransaction> {
    rows.into_iter()
        .filter_map(|row| {
            let Some(date) = parse_date(&row.raw_date) else {
                skipped.push(SkippedRow {
                    source_ref: row.source_ref,
                    reason: format!("unparseable date '{}'", row.raw_date),
                });
                return None;
            };
            let amount = parse_amount(&row.raw_amount);
            if amount == 0.0 {
                skipped.push(SkippedRow {
                    source_ref: row.source_ref,
                    reason: "zero or unparseable amount".to_string(),
                });
                return None;
            }

            let description = row.description.trim().to_string();
            let c = classify(config, &description, row.type_hint);
            Some(ClassifiedTransaction {
                date,
                amount: amount.abs(),
                transaction_type: c.transaction_type,
                category: c.category,
                description,
                is_tax_deductible: c.is_tax_deductible,
                is_tax_applicable: c.is_tax_applicable,
                extracted_from: extracted_from.to_string(),
                raw_source: row.raw,
                reference: row.reference,
            })
        })
        .collect()
}

fn distinct_years(transactions: &[Transaction]) -> Vec<i32> {
    let mut years: Vec<i32> = transactions.iter().map(|t| t.date.year()).collect();
    years.sort_unstable();
    years.dedup();
    years
}

#[derive(Debug, Clone)]
pub struct StatusView {
    pub status: DocumentStatus,
    pub error_message: Option<String>,
    pub transactions_extracted: Option<i64>,
}

/// Pure read of a document's processing state. No side effects.
pub fn get_document_status(conn: &Connection, document_id: i64) -> Result<StatusView> {
    let doc = db::load_document(conn, document_id)?;
    Ok(StatusView {
        status: doc.status,
        error_message: doc.error_message,
        transactions_extracted: doc.extracted_count,
    })
}
