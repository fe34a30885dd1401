use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::settings::db_path;

pub fn list(document_id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare(
        "SELECT id, transaction_date, transaction_type, category, amount, description, \
         is_tax_deductible, is_tax_applicable \
         FROM transactions WHERE document_id = ?1 ORDER BY transaction_date, id",
    )?;
    let rows: Vec<(i64, String, String, String, f64, String, bool, bool)> = stmt
        .query_map([document_id], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Type", "Category", "Amount", "Description", "Deductible", "VAT"]);
    for (id, date, tx_type, category, amount, description, deductible, vat) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(date),
            Cell::new(tx_type),
            Cell::new(category),
            Cell::new(format!("{amount:.2}")),
            Cell::new(description),
            Cell::new(if deductible { "yes" } else { "no" }),
            Cell::new(if vat { "yes" } else { "no" }),
        ]);
    }
    println!("Transactions from document {document_id}\n{table}");
    Ok(())
}
