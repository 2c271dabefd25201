use chrono::{Duration, NaiveDate};
use rand::Rng;

use super::open_store;
use crate::error::{ExpensiaError, Result};
use crate::models::TransactionInput;
use crate::table::TableEngine;

/// Tag and matching description for each kind of sample transaction.
const SAMPLES: &[(&str, &str)] = &[
    ("Food", "Grocery store"),
    ("Rent", "Monthly rent"),
    ("Utilities", "Electric bill"),
    ("Salary", "Company paycheck"),
    ("Freelance", "Client invoice"),
    ("Travel", "Flight to NYC"),
    ("Shopping", "New shoes"),
    ("Health", "Pharmacy visit"),
];

pub(crate) fn sample_inputs<R: Rng>(rng: &mut R, count: usize) -> Result<Vec<TransactionInput>> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .ok_or_else(|| ExpensiaError::Other("invalid demo base date".to_string()))?;
    let inputs = (0..count)
        .map(|_| {
            let (tag, description) = SAMPLES[rng.gen_range(0..SAMPLES.len())];
            let date = base + Duration::days(rng.gen_range(0..365));
            let amount: f64 = rng.gen_range(-500.0..1500.0);
            TransactionInput {
                date: date.format("%Y-%m-%d").to_string(),
                amount: format!("{amount:.2}"),
                tag: tag.to_string(),
                description: description.to_string(),
            }
        })
        .collect();
    Ok(inputs)
}

pub fn run(count: usize) -> Result<()> {
    let (settings, mut store) = open_store()?;
    let mut engine = TableEngine::new(settings.engine_config(0));
    engine.load(&store)?;

    let mut rng = rand::thread_rng();
    for input in sample_inputs(&mut rng, count)? {
        engine.add(&input)?;
    }

    let report = engine.save(&mut store)?;
    println!("Added {} demo transactions.", report.applied);
    if !report.is_clean() {
        eprintln!("{} failed to save.", report.failures.len());
    }
    println!("Run `expensia browse` to explore them.");
    Ok(())
}
