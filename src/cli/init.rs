use colored::Colorize;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{db_path, get_data_dir, save_settings, Settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    if let Some(dir) = data_dir {
        save_settings(&Settings { data_dir: dir })?;
    }
    let data_dir = get_data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let conn = get_connection(&db_path())?;
    init_db(&conn)?;

    println!("{} {}", "Initialized database at".green(), db_path().display());
    Ok(())
}
