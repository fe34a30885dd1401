use std::path::Path;

use sha2::{Digest, Sha256};

use crate::db::{find_account, get_connection, insert_document, NewDocument};
use crate::error::Result;
use crate::settings::db_path;

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

pub fn run(file: &str, account: &str, doc_type: &str) -> Result<()> {
    let path = Path::new(file);
    let conn = get_connection(&db_path())?;
    let account_id = find_account(&conn, account)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());
    let file_size = std::fs::metadata(path)?.len() as i64;
    let checksum = compute_checksum(path)?;

    let doc_id = insert_document(
        &conn,
        &NewDocument {
            account_id,
            document_type: doc_type,
            file_name: &file_name,
            file_path: &path.to_string_lossy(),
            file_size,
            mime_type: mime_for(&file_name),
            checksum: Some(&checksum),
        },
    )?;

    println!("Registered document {doc_id} ({file_name}, {file_size} bytes, pending)");
    Ok(())
}
