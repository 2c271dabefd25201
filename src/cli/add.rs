use chrono::Local;

use super::open_store;
use crate::error::Result;
use crate::fmt::money;
use crate::models::TransactionInput;
use crate::table::TableEngine;

pub fn run(date: Option<String>, amount: &str, tag: &str, description: Option<&str>) -> Result<()> {
    let (settings, mut store) = open_store()?;
    let mut engine = TableEngine::new(settings.engine_config(0));
    engine.load(&store)?;

    let input = TransactionInput {
        date: date.unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string()),
        amount: amount.to_string(),
        tag: tag.to_string(),
        description: description.unwrap_or_default().to_string(),
    };
    engine.add(&input)?;

    let mut report = engine.save(&mut store)?;
    if let Some(failure) = report.failures.pop() {
        return Err(failure.error);
    }

    if let Some(record) = engine.visible_records().last() {
        let amount = record.amount.map(|a| money(a, &settings.currency_sign)).unwrap_or_default();
        println!("Added {} {} {}", record.date, amount, record.tag);
    }
    Ok(())
}
