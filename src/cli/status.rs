use crate::db::get_connection;
use crate::error::Result;
use crate::pipeline::get_document_status;
use crate::settings::db_path;

pub fn run(document_id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let view = get_document_status(&conn, document_id)?;

    println!("Document:  {document_id}");
    println!("Status:    {}", view.status.as_str());
    if let Some(count) = view.transactions_extracted {
        println!("Extracted: {count}");
    }
    if let Some(message) = &view.error_message {
        println!("Error:     {message}");
    }
    Ok(())
}
