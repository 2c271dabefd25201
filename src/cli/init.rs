use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::{ExpensiaError, Result};
use crate::settings::{load_settings, save_settings, shellexpand_path, Settings};
use crate::table::FlushPolicy;

pub fn run(
    data_dir: Option<String>,
    currency: Option<String>,
    nickname: Option<String>,
    on_failed_save: Option<String>,
) -> Result<()> {
    let flush_policy = on_failed_save
        .map(|s| {
            FlushPolicy::parse(&s).ok_or_else(|| {
                ExpensiaError::Settings(format!("Unknown --on-failed-save '{s}' (use discard or requeue)"))
            })
        })
        .transpose()?;

    let mut settings = load_settings();
    let defaults = Settings::default();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    } else if settings.data_dir == defaults.data_dir {
        // First run, prompt for data dir
        println!("Data directory [{}]: ", settings.data_dir);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok();
        let chosen = input.trim();
        if !chosen.is_empty() {
            settings.data_dir = shellexpand_path(chosen);
        }
    }
    if let Some(sign) = currency {
        settings.currency_sign = sign.trim().to_string();
    }
    if let Some(name) = nickname {
        settings.nickname = name.trim().to_string();
    }
    if let Some(policy) = flush_policy {
        settings.table.flush_policy = policy;
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;

    println!("Initialized expensia at {}", resolved.display());
    Ok(())
}
