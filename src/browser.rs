use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    style::Style,
    text::{Line, Span},
    widgets::{Cell as TableCell, Paragraph, Row, Table},
    DefaultTerminal, Frame,
};
use tracing::{debug, warn};

use crate::error::{ExpensiaError, Result};
use crate::models::{RecordRef, TransactionInput};
use crate::store::RecordStore;
use crate::table::{DateFilter, FlushReport, SortColumn, Summary, TableEngine};
use crate::tui::{self, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};
use crate::validate::{Field, ValidationErrors};

const IDLE_POLL: Duration = Duration::from_millis(250);

const FORM_LABELS: [(&str, Field); 4] = [
    ("Date", Field::Date),
    ("Amount", Field::Amount),
    ("Tag", Field::Tag),
    ("Description", Field::Description),
];

/// Add/edit form. `target == None` creates a new record.
#[derive(Debug)]
struct EditForm {
    target: Option<RecordRef>,
    values: [String; 4],
    focus: usize,
    errors: Option<ValidationErrors>,
}

impl EditForm {
    fn new_record() -> Self {
        Self {
            target: None,
            values: [
                Local::now().format("%Y-%m-%d").to_string(),
                String::new(),
                String::new(),
                String::new(),
            ],
            focus: 1,
            errors: None,
        }
    }

    fn for_record(target: RecordRef, input: TransactionInput) -> Self {
        Self {
            target: Some(target),
            values: [input.date, input.amount, input.tag, input.description],
            focus: 0,
            errors: None,
        }
    }

    fn input(&self) -> TransactionInput {
        let [date, amount, tag, description] = self.values.clone();
        TransactionInput { date, amount, tag, description }
    }
}

/// Every overlay the table can open. Exactly one is active at a time.
#[derive(Debug)]
enum Dialog {
    Normal,
    Search(String),
    DateFilter(String),
    EditForm(EditForm),
    ConfirmDelete(RecordRef),
}

pub enum BrowseAction {
    Continue,
    Close,
    Save,
}

pub struct TableBrowser {
    engine: TableEngine,
    selected: usize,
    dialog: Dialog,
    status_message: Option<String>,
    summary: Rc<Cell<Summary>>,
}

impl TableBrowser {
    pub fn new(mut engine: TableEngine) -> Self {
        let summary = Rc::new(Cell::new(engine.summary()));
        let sink = Rc::clone(&summary);
        engine.on_summary_changed(Box::new(move |s| sink.set(*s)));
        Self {
            engine,
            selected: 0,
            dialog: Dialog::Normal,
            status_message: None,
            summary,
        }
    }

    pub fn run(&mut self, store: &mut dyn RecordStore) -> Result<()> {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            ratatui::restore();
            hook(info);
        }));

        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal, store);
        ratatui::restore();
        debug!(stats = ?self.engine.viewport().stats(), "browser closed");
        self.shutdown(store, result)
    }

    /// Flush whatever is still queued, even when the event loop failed, then
    /// hand back the loop's result. A loop error wins over a flush error.
    fn shutdown(&mut self, store: &mut dyn RecordStore, loop_result: Result<()>) -> Result<()> {
        let flushed = if self.engine.has_pending() {
            self.engine.save(store).map(|report| print_flush_report(&report))
        } else {
            Ok(())
        };
        match (loop_result, flushed) {
            (Err(e), Err(flush_err)) => {
                warn!(error = %flush_err, "shutdown flush failed");
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    /// Draw the browser into the given frame. Callable from an external event loop.
    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let form_height: u16 = match &self.dialog {
            Dialog::EditForm(form) => 2 + FORM_LABELS.len() as u16 + u16::from(form.errors.is_some()),
            _ => 0,
        };

        let areas = Layout::vertical([
            Constraint::Length(1),           // title
            Constraint::Fill(1),             // table
            Constraint::Length(form_height), // form
            Constraint::Length(1),           // summary
            Constraint::Length(1),           // status
            Constraint::Length(1),           // keys
        ])
        .split(area);
        let title_area = areas[0];
        let table_area = areas[1];
        let form_area = areas[2];
        let summary_area = areas[3];
        let status_area = areas[4];
        let keys_area = areas[5];

        frame.render_widget(Paragraph::new("Transactions").style(HEADER_STYLE), title_area);

        // Header row + margin
        let body_height = table_area.height.saturating_sub(2);
        self.engine.resize(u32::from(body_height));

        let viewport = self.engine.viewport();
        let row_height = viewport.row_height();
        let top = viewport.scroll_offset();
        let bottom = top.saturating_add(viewport.viewport_height());
        let top_row = (top / row_height) as usize;
        let shown = viewport.visible_rows();

        let rows: Vec<Row> = self
            .engine
            .bound_rows()
            .into_iter()
            .filter_map(|slot| {
                let index = slot.bound_index()?;
                if slot.y() < top || slot.y() >= bottom {
                    return None;
                }
                let f = slot.fields();
                let style = if index == self.selected { SELECTED_STYLE } else { Style::default() };
                Some(
                    Row::new(vec![
                        TableCell::from(f.date.clone()),
                        TableCell::from(Span::styled(f.amount.clone(), tui::tone_style(f.tone))),
                        TableCell::from(f.tag.clone()),
                        TableCell::from(f.description.clone()),
                    ])
                    .style(style)
                    .height(row_height.min(u32::from(u16::MAX)) as u16),
                )
            })
            .collect();

        let sort = self.engine.sort_state();
        let header: Vec<String> = [
            SortColumn::Date,
            SortColumn::Amount,
            SortColumn::Tag,
            SortColumn::Description,
        ]
        .iter()
        .map(|&c| format!("{}{}", c.label(), sort.indicator(c)))
        .collect();

        let widths = [
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Length(17),
            Constraint::Fill(1),
        ];
        let table = Table::new(rows, widths)
            .header(Row::new(header).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1);
        frame.render_widget(table, table_area);

        if let Dialog::EditForm(form) = &self.dialog {
            frame.render_widget(Paragraph::new(form_lines(form)), form_area);
        }

        // Summary line
        let s = self.summary.get();
        let sign = self.engine.currency();
        let summary = Line::from(vec![
            Span::raw(format!("{} shown | Income: ", s.count)),
            tui::money_span(s.income, sign),
            Span::raw(" | Expense: "),
            tui::money_span(s.expense, sign),
            Span::raw(" | Balance: "),
            tui::money_span(s.balance, sign),
        ]);
        frame.render_widget(Paragraph::new(summary), summary_area);

        // Status line
        let total = self.engine.visible_len();
        let first = if total == 0 { 0 } else { top_row + 1 };
        let last = (top_row + shown).min(total);
        let mut status = format!("Rows {first}-{last} of {total}");
        if total != self.engine.total_records() {
            status.push_str(&format!(" ({} loaded)", self.engine.total_records()));
        }
        let filters = self.engine.filter().describe();
        if !filters.is_empty() {
            status.push_str(&format!(" | {filters}"));
        }
        let pending = self.engine.pending().len();
        if pending > 0 {
            status.push_str(&format!(" | {pending} unsaved"));
        }
        if let Some(ref msg) = self.status_message {
            status.push_str(&format!(" | {msg}"));
        }
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), status_area);

        let keys_widget = match &self.dialog {
            Dialog::Normal => Paragraph::new(
                "\u{2191}/\u{2193}:select  /:search  i:sign  m:month  1-4:sort  a:add  e:edit  d:delete  c:clear  s:save  q:quit",
            )
            .style(FOOTER_STYLE),
            Dialog::Search(input) => Paragraph::new(format!("Search: {input}\u{2588}")),
            Dialog::DateFilter(input) => {
                Paragraph::new(format!("Year-month (YYYY, YYYY-MM, *-MM, empty=all): {input}\u{2588}"))
            }
            Dialog::EditForm(_) => {
                Paragraph::new("Tab/\u{2193}:next field  Shift-Tab/\u{2191}:previous  Enter=save  Esc=cancel")
                    .style(FOOTER_STYLE)
            }
            Dialog::ConfirmDelete(target) => Paragraph::new(Line::from(Span::styled(
                format!("Delete transaction {target}? (y/n)"),
                ERROR_STYLE,
            ))),
        };
        frame.render_widget(keys_widget, keys_area);
    }

    /// Handle a key event. Returns a BrowseAction indicating what the caller should do.
    pub fn handle_key_event(&mut self, code: KeyCode) -> BrowseAction {
        self.status_message = None;

        match &self.dialog {
            Dialog::Normal => return self.handle_normal_key(code),
            Dialog::Search(_) => self.handle_search_key(code),
            Dialog::DateFilter(_) => self.handle_date_filter_key(code),
            Dialog::EditForm(_) => self.handle_form_key(code),
            Dialog::ConfirmDelete(_) => self.handle_confirm_key(code),
        }
        BrowseAction::Continue
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> BrowseAction {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return BrowseAction::Close,
            KeyCode::Char('s') => return BrowseAction::Save,
            KeyCode::Down => self.move_selection(1),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::PageDown => self.page(1),
            KeyCode::PageUp => self.page(-1),
            KeyCode::Home => self.move_selection(i64::MIN / 2),
            KeyCode::End => self.move_selection(i64::MAX / 2),
            KeyCode::Char('/') => {
                self.dialog = Dialog::Search(self.engine.filter().search_text.clone());
            }
            KeyCode::Char('m') => self.dialog = Dialog::DateFilter(String::new()),
            KeyCode::Char('i') => {
                let next = self.engine.filter().sign.next();
                self.engine.set_sign_filter(next);
                self.clamp_selection();
            }
            KeyCode::Char('c') => {
                self.engine.set_filter(Default::default());
                self.clamp_selection();
            }
            KeyCode::Char('1') => self.engine.sort_by(SortColumn::Date),
            KeyCode::Char('2') => self.engine.sort_by(SortColumn::Amount),
            KeyCode::Char('3') => self.engine.sort_by(SortColumn::Tag),
            KeyCode::Char('4') => self.engine.sort_by(SortColumn::Description),
            KeyCode::Char('a') => self.dialog = Dialog::EditForm(EditForm::new_record()),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let (Some(target), Some(record)) = (
                    self.engine.record_ref_at(self.selected),
                    self.engine.record_at(self.selected),
                ) {
                    let form = EditForm::for_record(target, TransactionInput::from(record));
                    self.dialog = Dialog::EditForm(form);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(target) = self.engine.record_ref_at(self.selected) {
                    self.dialog = Dialog::ConfirmDelete(target);
                }
            }
            _ => {}
        }
        BrowseAction::Continue
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        let Dialog::Search(text) = &mut self.dialog else {
            return;
        };
        match code {
            KeyCode::Enter => self.dialog = Dialog::Normal,
            KeyCode::Esc => {
                self.dialog = Dialog::Normal;
                self.engine.set_search("");
            }
            KeyCode::Backspace => {
                text.pop();
                let text = text.clone();
                self.engine.set_search(&text);
            }
            KeyCode::Char(c) => {
                text.push(c);
                let text = text.clone();
                self.engine.set_search(&text);
            }
            _ => {}
        }
        self.clamp_selection();
    }

    fn handle_date_filter_key(&mut self, code: KeyCode) {
        let Dialog::DateFilter(text) = &mut self.dialog else {
            return;
        };
        match code {
            KeyCode::Esc => self.dialog = Dialog::Normal,
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(c) => text.push(c),
            KeyCode::Enter => {
                let input = text.trim().to_string();
                self.dialog = Dialog::Normal;
                match parse_date_filter(&input) {
                    Some(filter) => {
                        self.engine.set_date_filter(filter);
                        self.clamp_selection();
                    }
                    None => self.status_message = Some(format!("Invalid date filter '{input}'")),
                }
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        let Dialog::EditForm(form) = &mut self.dialog else {
            return;
        };
        match code {
            KeyCode::Esc => self.dialog = Dialog::Normal,
            KeyCode::Tab | KeyCode::Down => form.focus = (form.focus + 1) % FORM_LABELS.len(),
            KeyCode::BackTab | KeyCode::Up => {
                form.focus = (form.focus + FORM_LABELS.len() - 1) % FORM_LABELS.len();
            }
            KeyCode::Backspace => {
                form.values[form.focus].pop();
            }
            KeyCode::Char(c) => form.values[form.focus].push(c),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let Dialog::EditForm(form) = &mut self.dialog else {
            return;
        };
        let input = form.input();
        let result = match form.target {
            Some(target) => self.engine.edit(target, &input).map(|_| "Edited"),
            None => self.engine.add(&input).map(|_| "Added"),
        };
        match result {
            Ok(done) => {
                self.dialog = Dialog::Normal;
                self.status_message = Some(format!("{done} (unsaved)"));
                self.clamp_selection();
            }
            Err(ExpensiaError::Validation(errors)) => {
                if let Some(first) = errors.0.first() {
                    form.focus = FORM_LABELS
                        .iter()
                        .position(|(_, f)| *f == first.field())
                        .unwrap_or(form.focus);
                }
                form.errors = Some(errors);
            }
            Err(e) => {
                self.dialog = Dialog::Normal;
                self.status_message = Some(format!("Edit failed: {e}"));
            }
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode) {
        let Dialog::ConfirmDelete(target) = self.dialog else {
            return;
        };
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.dialog = Dialog::Normal;
                match self.engine.delete(target) {
                    Ok(()) => self.status_message = Some("Deleted (unsaved)".to_string()),
                    Err(e) => self.status_message = Some(format!("Delete failed: {e}")),
                }
                self.clamp_selection();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.dialog = Dialog::Normal,
            _ => {}
        }
    }

    fn page_rows(&self) -> i64 {
        self.engine.viewport().visible_rows() as i64
    }

    /// Scroll a full page and carry the selection along with it.
    fn page(&mut self, direction: i64) {
        let rows = direction * self.page_rows();
        self.engine.scroll_by_rows(rows);
        self.move_selection(rows);
    }

    fn move_selection(&mut self, delta: i64) {
        let total = self.engine.visible_len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        let target = (self.selected as i64).saturating_add(delta).clamp(0, total as i64 - 1);
        self.selected = target as usize;
        self.keep_selection_visible();
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.engine.visible_len().saturating_sub(1));
        self.keep_selection_visible();
    }

    fn keep_selection_visible(&mut self) {
        let viewport = self.engine.viewport();
        let row_height = viewport.row_height();
        let top = (viewport.scroll_offset() / row_height) as usize;
        let shown = viewport.visible_rows();
        let selected = u32::try_from(self.selected).unwrap_or(u32::MAX);
        if self.selected < top {
            self.engine.scroll_to(selected.saturating_mul(row_height));
        } else if self.selected >= top + shown {
            let first = selected.saturating_sub(shown as u32 - 1);
            self.engine.scroll_to(first.saturating_mul(row_height));
        }
    }

    fn save(&mut self, store: &mut dyn RecordStore) -> Result<()> {
        let report = self.engine.save(store)?;
        self.clamp_selection();
        self.status_message = Some(if report.is_clean() {
            format!("Saved {} change(s)", report.applied)
        } else {
            let first = &report.failures[0];
            format!(
                "Saved {}, {} failed ({}: {})",
                report.applied,
                report.failures.len(),
                first.mutation,
                first.error
            )
        });
        Ok(())
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal, store: &mut dyn RecordStore) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw_frame(frame))?;

            if event::poll(IDLE_POLL)? {
                if let Event::Key(KeyEvent { code, modifiers, kind, .. }) = event::read()? {
                    if kind != KeyEventKind::Press {
                        continue;
                    }
                    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                        break;
                    }
                    match self.handle_key_event(code) {
                        BrowseAction::Close => break,
                        BrowseAction::Continue => {}
                        BrowseAction::Save => {
                            if let Err(e) = self.save(store) {
                                warn!(error = %e, "save failed");
                                self.status_message = Some(format!("Save failed: {e}"));
                            }
                        }
                    }
                }
            }

            // Deferred re-render runs once pending input (resize bursts included) is drained.
            if !event::poll(Duration::ZERO)? {
                self.engine.on_idle();
            }
        }
        Ok(())
    }
}

fn form_lines(form: &EditForm) -> Vec<Line<'static>> {
    let title = if form.target.is_some() { "  Edit transaction" } else { "  New transaction" };
    let mut lines = vec![Line::from(Span::styled(title, HEADER_STYLE))];
    for (i, (label, field)) in FORM_LABELS.iter().enumerate() {
        let cursor = if i == form.focus { "\u{2588}" } else { "" };
        let marker = if i == form.focus { ">" } else { " " };
        let mut spans = vec![Span::raw(format!("  {marker} {label:<12} {}{cursor}", form.values[i]))];
        if let Some(err) = form.errors.as_ref().and_then(|e| e.for_field(*field)) {
            spans.push(Span::styled(format!("  {err}"), ERROR_STYLE));
        }
        lines.push(Line::from(spans));
    }
    if let Some(errors) = &form.errors {
        lines.push(Line::from(Span::styled(
            format!("  {} problem(s), fix and press Enter", errors.0.len()),
            ERROR_STYLE,
        )));
    }
    lines
}

/// `YYYY`, `YYYY-MM`, `*-MM` or empty for no date filter.
fn parse_date_filter(input: &str) -> Option<DateFilter> {
    match input.split_once('-') {
        Some((year, month)) => DateFilter::parse(year, month),
        None => DateFilter::parse(input, "*"),
    }
}

pub fn print_flush_report(report: &FlushReport) {
    if report.attempted() == 0 {
        return;
    }
    println!("Saved {} change(s).", report.applied);
    for failure in &report.failures {
        eprintln!("  Failed to {}: {}", failure.mutation, failure.error);
    }
    if report.requeued > 0 {
        eprintln!("  {} change(s) kept for the next save.", report.requeued);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionFields;
    use crate::table::{EngineConfig, SignFilter};
    use crate::test_utils::MemoryStore;

    fn fields(date: &str, amount: f64, tag: &str) -> TransactionFields {
        TransactionFields {
            date: date.to_string(),
            amount,
            tag: tag.to_string(),
            description: String::new(),
        }
    }

    fn make_store(n: i64) -> MemoryStore {
        MemoryStore::with_records(
            (1..=n)
                .map(|i| {
                    let amount = if i % 2 == 0 { -(i as f64) } else { i as f64 * 10.0 };
                    let date = format!("2024-{:02}-{:02}", (i - 1) % 12 + 1, (i - 1) % 28 + 1);
                    (i, fields(&date, amount, &format!("tag{i}")))
                })
                .collect(),
        )
    }

    fn make_browser(store: &MemoryStore) -> TableBrowser {
        let config = EngineConfig { viewport_height: 10, ..Default::default() };
        let mut engine = TableEngine::new(config);
        engine.load(store).unwrap();
        TableBrowser::new(engine)
    }

    fn type_text(browser: &mut TableBrowser, text: &str) {
        for c in text.chars() {
            browser.handle_key_event(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_handle_key_returns_close_on_q() {
        let store = make_store(5);
        let mut browser = make_browser(&store);
        assert!(matches!(browser.handle_key_event(KeyCode::Char('q')), BrowseAction::Close));
    }

    #[test]
    fn test_s_requests_save() {
        let store = make_store(5);
        let mut browser = make_browser(&store);
        assert!(matches!(browser.handle_key_event(KeyCode::Char('s')), BrowseAction::Save));
    }

    #[test]
    fn test_selection_scrolls_viewport() {
        let store = make_store(50);
        let mut browser = make_browser(&store);
        for _ in 0..12 {
            browser.handle_key_event(KeyCode::Down);
        }
        assert_eq!(browser.selected, 12);
        assert_eq!(browser.engine.viewport().scroll_offset(), 3);

        browser.handle_key_event(KeyCode::Home);
        assert_eq!(browser.selected, 0);
        assert_eq!(browser.engine.viewport().scroll_offset(), 0);

        browser.handle_key_event(KeyCode::End);
        assert_eq!(browser.selected, 49);
        assert_eq!(browser.engine.viewport().scroll_offset(), 40);

        browser.handle_key_event(KeyCode::Up);
        assert_eq!(browser.selected, 48);
    }

    #[test]
    fn test_page_keys_scroll_a_page() {
        let store = make_store(50);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::PageDown);
        assert_eq!(browser.selected, 10);
        assert_eq!(browser.engine.viewport().scroll_offset(), 10);

        browser.handle_key_event(KeyCode::PageDown);
        browser.handle_key_event(KeyCode::PageUp);
        assert_eq!(browser.selected, 10);
        assert_eq!(browser.engine.viewport().scroll_offset(), 10);

        for _ in 0..6 {
            browser.handle_key_event(KeyCode::PageDown);
        }
        assert_eq!(browser.selected, 49);
        assert_eq!(browser.engine.viewport().scroll_offset(), 40);
    }

    #[test]
    fn test_search_filters_live_and_esc_clears() {
        let store = make_store(20);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('/'));
        assert!(matches!(browser.dialog, Dialog::Search(_)));
        type_text(&mut browser, "tag1");
        // tag1, tag10..tag19
        assert_eq!(browser.engine.visible_len(), 11);
        assert_eq!(browser.summary.get().count, 11);

        browser.handle_key_event(KeyCode::Esc);
        assert!(matches!(browser.dialog, Dialog::Normal));
        assert_eq!(browser.engine.visible_len(), 20);
    }

    #[test]
    fn test_search_enter_keeps_filter() {
        let store = make_store(20);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('/'));
        type_text(&mut browser, "-");
        browser.handle_key_event(KeyCode::Enter);
        assert_eq!(browser.engine.visible_len(), 10);
        assert!(browser.engine.visible_records().all(|r| r.amount < Some(0.0)));
    }

    #[test]
    fn test_sign_filter_cycles() {
        let store = make_store(10);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('i'));
        assert_eq!(browser.engine.filter().sign, SignFilter::IncomeOnly);
        browser.handle_key_event(KeyCode::Char('i'));
        assert_eq!(browser.engine.filter().sign, SignFilter::ExpenseOnly);
        browser.handle_key_event(KeyCode::Char('i'));
        assert_eq!(browser.engine.filter().sign, SignFilter::All);
    }

    #[test]
    fn test_date_filter_dialog() {
        let store = make_store(24);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('m'));
        type_text(&mut browser, "2024-03");
        browser.handle_key_event(KeyCode::Enter);
        assert_eq!(browser.engine.visible_len(), 2);

        browser.handle_key_event(KeyCode::Char('m'));
        type_text(&mut browser, "2024-13");
        browser.handle_key_event(KeyCode::Enter);
        assert!(browser.status_message.as_deref().unwrap().contains("2024-13"));
        assert_eq!(browser.engine.visible_len(), 2);

        browser.handle_key_event(KeyCode::Char('c'));
        assert_eq!(browser.engine.visible_len(), 24);
    }

    #[test]
    fn test_sort_keys_toggle_direction() {
        let store = make_store(5);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('2'));
        let first = browser.engine.record_at(0).and_then(|r| r.amount);
        assert_eq!(first, Some(-4.0));
        browser.handle_key_event(KeyCode::Char('2'));
        let first = browser.engine.record_at(0).and_then(|r| r.amount);
        assert_eq!(first, Some(50.0));
    }

    #[test]
    fn test_add_form_flow() {
        let store = make_store(3);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('a'));
        // Focus starts on the amount field with today's date filled in.
        type_text(&mut browser, "-7.25");
        browser.handle_key_event(KeyCode::Tab);
        type_text(&mut browser, "Coffee");
        browser.handle_key_event(KeyCode::Enter);

        assert!(matches!(browser.dialog, Dialog::Normal));
        assert_eq!(browser.engine.total_records(), 4);
        assert!(browser.engine.has_pending());
        assert!(browser.status_message.as_deref().unwrap().contains("Added"));
    }

    #[test]
    fn test_invalid_form_stays_open_with_errors() {
        let store = make_store(3);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('a'));
        type_text(&mut browser, "abc");
        browser.handle_key_event(KeyCode::Enter);

        let Dialog::EditForm(form) = &browser.dialog else {
            panic!("form should stay open");
        };
        let errors = form.errors.as_ref().unwrap();
        assert!(errors.for_field(Field::Amount).is_some());
        assert!(errors.for_field(Field::Tag).is_some());
        assert_eq!(form.focus, 1);
        assert!(!browser.engine.has_pending());
    }

    #[test]
    fn test_edit_selected_row() {
        let store = make_store(3);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('e'));
        let Dialog::EditForm(form) = &browser.dialog else {
            panic!("expected edit form");
        };
        assert_eq!(form.target, Some(RecordRef::Stored(1)));
        assert_eq!(form.values[1], "10.00");

        browser.handle_key_event(KeyCode::Tab);
        browser.handle_key_event(KeyCode::Tab);
        for _ in 0.."tag1".len() {
            browser.handle_key_event(KeyCode::Backspace);
        }
        type_text(&mut browser, "Books");
        browser.handle_key_event(KeyCode::Enter);
        assert_eq!(browser.engine.record_at(0).map(|r| r.tag.as_str()), Some("Books"));
    }

    #[test]
    fn test_shutdown_flushes_pending_edits_when_loop_fails() {
        let mut store = make_store(3);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('d'));
        browser.handle_key_event(KeyCode::Char('y'));
        assert!(browser.engine.has_pending());

        let loop_error = ExpensiaError::Io(std::io::Error::other("terminal gone"));
        let result = browser.shutdown(&mut store, Err(loop_error));

        assert!(matches!(result, Err(ExpensiaError::Io(_))));
        assert_eq!(store.delete_calls(), &[1]);
        assert_eq!(store.list().unwrap().len(), 2);
        assert!(!browser.engine.has_pending());
    }

    #[test]
    fn test_shutdown_without_pending_passes_result_through() {
        let mut store = make_store(3);
        let mut browser = make_browser(&store);
        assert!(browser.shutdown(&mut store, Ok(())).is_ok());
        assert!(store.delete_calls().is_empty());
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let store = make_store(3);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('d'));
        assert!(matches!(browser.dialog, Dialog::ConfirmDelete(RecordRef::Stored(1))));
        browser.handle_key_event(KeyCode::Char('n'));
        assert_eq!(browser.engine.visible_len(), 3);

        browser.handle_key_event(KeyCode::Down);
        browser.handle_key_event(KeyCode::Down);
        browser.handle_key_event(KeyCode::Char('d'));
        browser.handle_key_event(KeyCode::Char('y'));
        assert_eq!(browser.engine.visible_len(), 2);
        assert_eq!(browser.selected, 1);
        assert_eq!(browser.summary.get().count, 2);
    }

    #[test]
    fn test_save_reports_failures() {
        let mut store = make_store(3);
        store.fail_on_delete(1);
        let mut browser = make_browser(&store);
        browser.handle_key_event(KeyCode::Char('d'));
        browser.handle_key_event(KeyCode::Char('y'));
        browser.save(&mut store).unwrap();
        let msg = browser.status_message.as_deref().unwrap();
        assert!(msg.contains("1 failed"), "{msg}");
        assert_eq!(browser.engine.visible_len(), 3);
    }

    #[test]
    fn test_parse_date_filter_forms() {
        assert_eq!(parse_date_filter(""), Some(DateFilter::default()));
        assert_eq!(parse_date_filter("2024").unwrap().year.as_deref(), Some("2024"));
        assert_eq!(parse_date_filter("*-03").unwrap().month.as_deref(), Some("03"));
        assert_eq!(parse_date_filter("2024-3").unwrap().month.as_deref(), Some("03"));
        assert_eq!(parse_date_filter("20x4"), None);
    }
}
