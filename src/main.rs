mod browser;
mod cli;
mod db;
mod error;
mod fmt;
mod logging;
mod models;
mod settings;
mod store;
mod table;
#[cfg(test)]
mod test_utils;
mod tui;
mod validate;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let data_dir = settings::get_data_dir();
    if data_dir.is_dir() {
        if let Err(e) = logging::init(&data_dir) {
            eprintln!("Warning: {e}");
        }
    }

    let result = match cli.command.unwrap_or(Commands::Browse) {
        Commands::Init { data_dir, currency, nickname, on_failed_save } => {
            cli::init::run(data_dir, currency, nickname, on_failed_save)
        }
        Commands::Add { date, amount, tag, description } => {
            cli::add::run(date, &amount, &tag, description.as_deref())
        }
        Commands::List { search, sign, year, month, sort, desc } => cli::list::run(cli::list::ListArgs {
            search,
            sign,
            year,
            month,
            sort,
            desc,
        }),
        Commands::Browse => cli::browse::run(),
        Commands::Demo { count } => cli::demo::run(count),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
