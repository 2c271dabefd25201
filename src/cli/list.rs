use colored::Colorize;
use comfy_table::{Cell, Table};

use super::open_store;
use crate::error::{ExpensiaError, Result};
use crate::fmt::money;
use crate::table::{DateFilter, FilterState, SignFilter, SortColumn, SortState, TableEngine};

pub struct ListArgs {
    pub search: Option<String>,
    pub sign: String,
    pub year: Option<String>,
    pub month: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
}

impl ListArgs {
    fn filter(&self) -> Result<FilterState> {
        let sign = SignFilter::parse(&self.sign).ok_or_else(|| {
            ExpensiaError::Other(format!(
                "Unknown sign filter '{}', expected all, income or expense",
                self.sign
            ))
        })?;
        let year = self.year.as_deref().unwrap_or("*");
        let month = self.month.as_deref().unwrap_or("*");
        let date = DateFilter::parse(year, month).ok_or_else(|| {
            ExpensiaError::Other(format!("Invalid date filter: year '{year}', month '{month}'"))
        })?;
        Ok(FilterState {
            search_text: self.search.clone().unwrap_or_default(),
            sign,
            date,
        })
    }

    fn sort(&self) -> Result<SortState> {
        let column = match self.sort.as_deref() {
            Some(name) => Some(SortColumn::parse(name).ok_or_else(|| {
                ExpensiaError::Other(format!(
                    "Unknown sort column '{name}', expected date, amount, tag or description"
                ))
            })?),
            None => None,
        };
        Ok(SortState { column, ascending: !self.desc })
    }
}

pub fn run(args: ListArgs) -> Result<()> {
    let filter = args.filter()?;
    let sort = args.sort()?;

    let (settings, store) = open_store()?;
    let sign = settings.currency_sign.as_str();
    let mut engine = TableEngine::new(settings.engine_config(0));
    engine.load(&store)?;
    engine.set_filter(filter);
    engine.set_sort(sort);

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Amount", "Tag", "Description"]);
    for record in engine.visible_records() {
        let amount = match record.amount {
            Some(a) if a < 0.0 => money(a, sign).red().to_string(),
            Some(a) => money(a, sign).green().to_string(),
            None => "?".magenta().to_string(),
        };
        table.add_row(vec![
            Cell::new(record.id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(&record.date),
            Cell::new(amount),
            Cell::new(&record.tag),
            Cell::new(&record.description),
        ]);
    }

    let described = engine.filter().describe();
    let title = if described.is_empty() { "All transactions".to_string() } else { described };
    println!("{}\n{table}", title.bold());

    let s = engine.summary();
    println!(
        "{} shown | Income: {} | Expense: {} | Balance: {}",
        s.count,
        money(s.income, sign).green(),
        money(s.expense, sign).red(),
        if s.balance < 0.0 {
            money(s.balance, sign).red().bold()
        } else {
            money(s.balance, sign).green().bold()
        },
    );

    let integrity = engine.integrity();
    if !integrity.is_clean() {
        println!(
            "{}",
            format!(
                "Warning: {} unreadable amount(s), {} malformed date(s) in stored data",
                integrity.unreadable_amounts, integrity.malformed_dates
            )
            .yellow()
        );
    }
    Ok(())
}
