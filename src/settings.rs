use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db::DB_FILENAME;
use crate::error::{ExpensiaError, Result};
use crate::table::{EngineConfig, FlushPolicy};

pub const CURRENCY_SIGNS: [&str; 3] = ["€", "$", "£"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default = "default_currency_sign")]
    pub currency_sign: String,
    #[serde(default)]
    pub table: TableSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Terminal lines per row.
    pub row_height: u32,
    /// Extra rows bound above and below the viewport.
    pub buffer_rows: usize,
    pub flush_policy: FlushPolicy,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            row_height: 1,
            buffer_rows: 3,
            flush_policy: FlushPolicy::Discard,
        }
    }
}

fn default_currency_sign() -> String {
    CURRENCY_SIGNS[0].to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            nickname: String::new(),
            currency_sign: default_currency_sign(),
            table: TableSettings::default(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILENAME)
    }

    /// Engine parameters for a viewport `viewport_height` lines tall.
    pub fn engine_config(&self, viewport_height: u32) -> EngineConfig {
        EngineConfig {
            row_height: self.table.row_height.max(1),
            buffer_rows: self.table.buffer_rows,
            viewport_height,
            currency: self.currency_sign.clone(),
            flush_policy: self.table.flush_policy,
        }
    }
}

fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("EXPENSIA_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("expensia")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("expensia")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    if !CURRENCY_SIGNS.contains(&settings.currency_sign.as_str()) {
        return Err(ExpensiaError::Settings(format!(
            "unsupported currency sign '{}', expected one of {}",
            settings.currency_sign,
            CURRENCY_SIGNS.join(" ")
        )));
    }
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ExpensiaError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(&load_settings().data_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
