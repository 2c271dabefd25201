use std::path::PathBuf;

use crate::db::record_count;
use crate::error::Result;
use crate::logging::log_path;
use crate::settings::load_settings;
use crate::store::{RecordStore, SqliteStore};
use crate::table::IntegrityReport;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = PathBuf::from(&settings.data_dir);
    let db_path = settings.db_path();

    println!("Nickname:   {}", if settings.nickname.is_empty() { "(not set)" } else { &settings.nickname });
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("Log file:   {}", log_path(&data_dir).display());
    println!("Currency:   {}", settings.currency_sign);
    println!("On failed save: {:?}", settings.table.flush_policy);

    if db_path.exists() {
        let store = SqliteStore::open(&db_path)?;
        let count = record_count(store.conn())?;
        let integrity = IntegrityReport::scan(&store.list()?);

        println!();
        println!("Transactions:       {count}");
        println!("Unreadable amounts: {}", integrity.unreadable_amounts);
        println!("Malformed dates:    {}", integrity.malformed_dates);
    } else {
        println!();
        println!("Database not found. Run `expensia init` to set up.");
    }

    Ok(())
}
