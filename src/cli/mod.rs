pub mod add;
pub mod browse;
pub mod demo;
pub mod init;
pub mod list;
pub mod status;

use clap::{Parser, Subcommand};

use crate::error::{ExpensiaError, Result};
use crate::settings::{load_settings, Settings};
use crate::store::SqliteStore;

/// Load settings and open the configured database, refusing to create one
/// outside of `init`.
pub(crate) fn open_store() -> Result<(Settings, SqliteStore)> {
    let settings = load_settings();
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(ExpensiaError::Other(format!(
            "Database not found at {}. Run `expensia init` to set up.",
            db_path.display()
        )));
    }
    let store = SqliteStore::open(&db_path)?;
    Ok((settings, store))
}

#[derive(Parser)]
#[command(name = "expensia", about = "Personal expense tracker with a live transaction table.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Expensia: choose a data directory and initialize the database.
    Init {
        /// Path for Expensia data (default: ~/Documents/expensia)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Currency sign used for display: € $ or £
        #[arg(long)]
        currency: Option<String>,
        /// Name shown by `status`
        #[arg(long)]
        nickname: Option<String>,
        /// What a save does with changes the store rejects: discard or requeue
        #[arg(long = "on-failed-save")]
        on_failed_save: Option<String>,
    },
    /// Record a transaction. Negative amounts are expenses.
    Add {
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        tag: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Print transactions matching the given filters.
    List {
        /// Case-insensitive text search; a lone - or + selects expenses or income
        #[arg(long, allow_hyphen_values = true)]
        search: Option<String>,
        /// all, income or expense
        #[arg(long, default_value = "all")]
        sign: String,
        /// Four-digit year, or * for any
        #[arg(long)]
        year: Option<String>,
        /// Month 1-12, or * for any
        #[arg(long)]
        month: Option<String>,
        /// date, amount, tag or description
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
    },
    /// Browse, filter and edit transactions interactively.
    Browse,
    /// Load random sample transactions to explore Expensia.
    Demo {
        /// Number of transactions to generate
        #[arg(long, default_value = "200")]
        count: usize,
    },
    /// Show current database and data-integrity statistics.
    Status,
}
