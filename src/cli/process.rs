use colored::Colorize;

use crate::classifier::ClassifierConfig;
use crate::db::get_connection;
use crate::error::Result;
use crate::notifier::{LoggingSink, Notifier};
use crate::pipeline::process_document;
use crate::settings::db_path;

pub fn run(document_id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let config = ClassifierConfig::default();
    let notifier = Notifier::spawn(LoggingSink);

    let outcome = process_document(&conn, &config, &notifier, document_id)?;

    println!(
        "{} {} transactions extracted, {} rows skipped",
        "Completed:".green(),
        outcome.transactions_extracted,
        outcome.skipped_rows.len()
    );
    for skip in &outcome.skipped_rows {
        println!("  skipped {}: {}", skip.source_ref, skip.reason);
    }
    Ok(())
}
