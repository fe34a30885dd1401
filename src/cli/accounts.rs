use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::settings::db_path;

pub fn add(name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    conn.execute("INSERT INTO accounts (name) VALUES (?1)", [name])?;
    println!("Added account: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare("SELECT id, name, created_at FROM accounts ORDER BY id")?;
    let rows: Vec<(i64, String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Created"]);
    for (id, name, created_at) in rows {
        table.add_row(vec![Cell::new(id), Cell::new(name), Cell::new(created_at)]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
