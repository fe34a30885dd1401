use rusqlite::Connection;

use crate::error::Result;
use crate::models::{Category, ClassifiedTransaction, Transaction};

/// The equivalence check is intentionally coarse: same account, date, amount
/// and description, with no document comparison, so re-uploading a statement
/// that overlaps a prior one deduplicates naturally.
fn exists_equivalent(conn: &Connection, account_id: i64, tx: &ClassifiedTransaction) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM transactions \
         WHERE account_id = ?1 AND transaction_date = ?2 AND amount = ?3 AND description = ?4",
    )?;
    let date = tx.date.format("%Y-%m-%d").to_string();
    Ok(stmt.exists(rusqlite::params![account_id, date, tx.amount, tx.description])?)
}

/// Persist classified transactions that have no equivalent yet. Returns only
/// the newly created rows; equivalents are skipped, which makes re-running
/// ingestion idempotent. The only write path for extracted transactions.
pub fn persist_new(
    conn: &Connection,
    account_id: i64,
    document_id: i64,
    transactions: &[ClassifiedTransaction],
) -> Result<Vec<Transaction>> {
    let mut created = Vec::new();

    for tx in transactions {
        debug_assert!(Category::valid_for(tx.transaction_type).contains(&tx.category));
        if exists_equivalent(conn, account_id, tx)? {
            continue;
        }
        let date = tx.date.format("%Y-%m-%d").to_string();
        conn.execute(
            "INSERT INTO transactions (account_id, document_id, transaction_type, category, \
             amount, description, transaction_date, source, is_tax_deductible, is_tax_applicable, \
             extracted_from, raw_source, reference) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'bank_statement', ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                account_id,
                document_id,
                tx.transaction_type.as_str(),
                tx.category.as_str(),
                tx.amount,
                tx.description,
                date,
                tx.is_tax_deductible,
                tx.is_tax_applicable,
                tx.extracted_from,
                tx.raw_source,
                tx.reference,
            ],
        )?;
        created.push(Transaction {
            id: conn.last_insert_rowid(),
            account_id,
            document_id: Some(document_id),
            date: tx.date,
            amount: tx.amount,
            transaction_type: tx.transaction_type,
            category: tx.category,
            description: tx.description.clone(),
            is_tax_deductible: tx.is_tax_deductible,
            is_tax_applicable: tx.is_tax_applicable,
        });
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::tests::{add_account, add_document, test_db};
    use crate::models::{Category, TransactionType};

    fn sample(amount: f64, description: &str) -> ClassifiedTransaction {
        ClassifiedTransaction {
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            amount,
            transaction_type: TransactionType::Income,
            category: Category::Salary,
            description: description.to_string(),
            is_tax_deductible: false,
            is_tax_applicable: true,
            extracted_from: "csv".to_string(),
            raw_source: String::new(),
            reference: None,
        }
    }

    #[test]
    fn test_persist_new_inserts_and_skips_equivalents() {
        let (_dir, conn) = test_db();
        let account_id = add_account(&conn, "Main");
        let doc_id = add_document(&conn, account_id, "/tmp/a.csv");

        let batch = [sample(150000.0, "SALARY PAYMENT MARCH")];
        let first = persist_new(&conn, account_id, doc_id, &batch).unwrap();
        assert_eq!(first.len(), 1);

        let second = persist_new(&conn, account_id, doc_id, &batch).unwrap();
        assert_eq!(second.len(), 0);

        let count: i64 = conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_dedup_ignores_source_document() {
        let (_dir, conn) = test_db();
        let account_id = add_account(&conn, "Main");
        let doc_a = add_document(&conn, account_id, "/tmp/a.csv");
        let doc_b = add_document(&conn, account_id, "/tmp/b.csv");

        let batch = [sample(150000.0, "SALARY PAYMENT MARCH")];
        assert_eq!(persist_new(&conn, account_id, doc_a, &batch).unwrap().len(), 1);
        // Overlapping upload through a different document dedupes the same way.
        assert_eq!(persist_new(&conn, account_id, doc_b, &batch).unwrap().len(), 0);
    }

    #[test]
    fn test_different_accounts_do_not_collide() {
        let (_dir, conn) = test_db();
        let a = add_account(&conn, "A");
        let b = add_account(&conn, "B");
        let doc_a = add_document(&conn, a, "/tmp/a.csv");
        let doc_b = add_document(&conn, b, "/tmp/b.csv");

        let batch = [sample(150000.0, "SALARY PAYMENT MARCH")];
        assert_eq!(persist_new(&conn, a, doc_a, &batch).unwrap().len(), 1);
        assert_eq!(persist_new(&conn, b, doc_b, &batch).unwrap().len(), 1);
    }

    #[test]
    fn test_field_change_is_not_equivalent() {
        let (_dir, conn) = test_db();
        let account_id = add_account(&conn, "Main");
        let doc_id = add_document(&conn, account_id, "/tmp/a.csv");

        persist_new(&conn, account_id, doc_id, &[sample(150000.0, "SALARY PAYMENT MARCH")]).unwrap();
        let created = persist_new(
            &conn,
            account_id,
            doc_id,
            &[sample(150000.0, "SALARY PAYMENT APRIL"), sample(99.0, "SALARY PAYMENT MARCH")],
        )
        .unwrap();
        assert_eq!(created.len(), 2);
    }
}
