use super::open_store;
use crate::browser::TableBrowser;
use crate::error::Result;
use crate::table::TableEngine;

/// Lines taken by the title, table header, summary, status and key hints.
const CHROME_LINES: u16 = 6;

pub fn run() -> Result<()> {
    let (settings, mut store) = open_store()?;
    let (_, rows) = crossterm::terminal::size().unwrap_or((80, 24));
    let viewport_height = u32::from(rows.saturating_sub(CHROME_LINES));

    let mut engine = TableEngine::new(settings.engine_config(viewport_height));
    engine.load(&store)?;

    let mut browser = TableBrowser::new(engine);
    browser.run(&mut store)
}
