//! Transaction table engine: holds the loaded records, derives the visible
//! sequence from filter and sort state, binds it to pooled row slots, keeps
//! the summary current and routes edits through the mutation queue.

pub mod filter;
pub mod pool;
pub mod queue;
pub mod sort;
pub mod summary;
pub mod viewport;

use tracing::{debug, warn};

use crate::error::{ExpensiaError, Result};
use crate::models::{is_canonical_date, LocalKey, RecordRef, TransactionInput, TransactionRecord};
use crate::store::RecordStore;
use crate::validate::validate;

pub use filter::{DateFilter, FilterState, SignFilter};
pub use pool::{AmountTone, RowViewSlot};
pub use queue::{FlushPolicy, FlushReport, MutationQueue, PendingMutation};
pub use sort::{SortColumn, SortState};
pub use summary::{Summary, SummaryListener};
pub use viewport::Viewport;

/// Counts of stored rows the engine kept despite bad data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub unreadable_amounts: usize,
    pub malformed_dates: usize,
}

impl IntegrityReport {
    pub fn scan(records: &[TransactionRecord]) -> Self {
        let mut report = Self::default();
        for record in records {
            if record.amount.is_none() {
                report.unreadable_amounts += 1;
                warn!(id = ?record.id, "unreadable amount");
            }
            if !is_canonical_date(&record.date) {
                report.malformed_dates += 1;
                warn!(id = ?record.id, date = %record.date, "malformed date");
            }
        }
        report
    }

    pub fn is_clean(&self) -> bool {
        self.unreadable_amounts == 0 && self.malformed_dates == 0
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub row_height: u32,
    pub buffer_rows: usize,
    pub viewport_height: u32,
    pub currency: String,
    pub flush_policy: FlushPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            row_height: 1,
            buffer_rows: 3,
            viewport_height: 20,
            currency: "€".to_string(),
            flush_policy: FlushPolicy::Discard,
        }
    }
}

pub struct TableEngine {
    records: Vec<TransactionRecord>,
    /// Parallel to `records`.
    keys: Vec<LocalKey>,
    next_key: u64,
    filter: FilterState,
    sort: SortState,
    visible: Vec<usize>,
    summary: Summary,
    notifier: summary::SummaryNotifier,
    viewport: Viewport,
    queue: MutationQueue,
    integrity: IntegrityReport,
    currency: String,
    flush_policy: FlushPolicy,
}

impl TableEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            records: Vec::new(),
            keys: Vec::new(),
            next_key: 0,
            filter: FilterState::default(),
            sort: SortState::default(),
            visible: Vec::new(),
            summary: Summary::default(),
            notifier: summary::SummaryNotifier::default(),
            viewport: Viewport::new(config.row_height, config.buffer_rows, config.viewport_height),
            queue: MutationQueue::new(),
            integrity: IntegrityReport::default(),
            currency: config.currency,
            flush_policy: config.flush_policy,
        }
    }

    /// Replace the in-memory records with the store's and recompute
    /// everything. Mutations still queued are replayed on top so the view
    /// keeps showing them.
    pub fn load(&mut self, store: &dyn RecordStore) -> Result<()> {
        let records = store.list()?;
        self.integrity = IntegrityReport::scan(&records);
        self.keys = records.iter().map(|_| self.fresh_key()).collect();
        self.records = records;

        let pending: Vec<PendingMutation> = self.queue.pending().to_vec();
        for mutation in &pending {
            if let Err(e) = self.apply_local(mutation) {
                debug!(%mutation, error = %e, "queued mutation has no local target");
            }
        }

        debug!(records = self.records.len(), pending = pending.len(), "loaded records");
        self.refresh();
        Ok(())
    }

    fn fresh_key(&mut self) -> LocalKey {
        let key = LocalKey(self.next_key);
        self.next_key += 1;
        key
    }

    // --- derived state ---

    fn compute_visible(&mut self) {
        let mut visible = filter::apply(&self.records, &self.filter, &self.currency);
        if let Some(column) = self.sort.column {
            sort::sort(&self.records, &mut visible, column, self.sort.ascending);
        }
        self.visible = visible;
    }

    /// Full recompute after records or filters changed.
    fn refresh(&mut self) {
        self.compute_visible();
        self.summary = summary::summarize(&self.records, &self.visible);
        self.notifier.publish(self.summary);
        self.rerender();
    }

    fn rerender(&mut self) {
        self.viewport.invalidate();
        self.viewport.render(&self.records, &self.visible, &self.currency);
    }

    // --- filters and sort ---

    pub fn set_search(&mut self, text: &str) {
        if self.filter.search_text == text {
            return;
        }
        self.filter.search_text = text.to_string();
        self.refresh();
    }

    pub fn set_sign_filter(&mut self, sign: SignFilter) {
        if self.filter.sign == sign {
            return;
        }
        self.filter.sign = sign;
        self.refresh();
    }

    pub fn set_date_filter(&mut self, date: DateFilter) {
        if self.filter.date == date {
            return;
        }
        self.filter.date = date;
        self.refresh();
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        if self.filter == filter {
            return;
        }
        self.filter = filter;
        self.refresh();
    }

    /// Column header activation. Same column twice flips direction. The
    /// visible set is unchanged so the summary is left alone.
    pub fn sort_by(&mut self, column: SortColumn) {
        self.sort.select(column);
        self.compute_visible();
        self.rerender();
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        self.compute_visible();
        self.rerender();
    }

    // --- viewport ---

    pub fn scroll_to(&mut self, offset: u32) {
        self.viewport.scroll_to(offset, self.visible.len());
        self.viewport.render(&self.records, &self.visible, &self.currency);
    }

    pub fn scroll_by_rows(&mut self, rows: i64) {
        self.viewport.scroll_by_rows(rows, self.visible.len());
        self.viewport.render(&self.records, &self.visible, &self.currency);
    }

    /// Note a new viewport height. Rendering waits for [TableEngine::on_idle].
    pub fn resize(&mut self, viewport_height: u32) {
        self.viewport.resize(viewport_height);
    }

    /// Run deferred work. Returns whether anything was re-rendered.
    pub fn on_idle(&mut self) -> bool {
        if !self.viewport.take_refresh() {
            return false;
        }
        self.viewport.render(&self.records, &self.visible, &self.currency)
    }

    // --- mutations ---

    /// Validate and queue a new record; it shows up in the table at once.
    pub fn add(&mut self, input: &TransactionInput) -> Result<LocalKey> {
        let fields = validate(input)?;
        let key = self.fresh_key();
        let mutation = PendingMutation::Add { key, fields };
        self.queue.enqueue(mutation.clone())?;
        self.apply_local(&mutation)?;
        self.refresh();
        Ok(key)
    }

    pub fn edit(&mut self, target: RecordRef, input: &TransactionInput) -> Result<()> {
        let fields = validate(input)?;
        self.position_of(target)?;
        let mutation = PendingMutation::Edit { target, fields };
        self.queue.enqueue(mutation.clone())?;
        self.apply_local(&mutation)?;
        self.refresh();
        Ok(())
    }

    pub fn delete(&mut self, target: RecordRef) -> Result<()> {
        self.position_of(target)?;
        let mutation = PendingMutation::Delete { target };
        self.queue.enqueue(mutation.clone())?;
        self.apply_local(&mutation)?;
        self.refresh();
        Ok(())
    }

    fn position_of(&self, target: RecordRef) -> Result<usize> {
        let found = match target {
            RecordRef::Stored(id) => self.records.iter().position(|r| r.id == Some(id)),
            RecordRef::Local(key) => self.keys.iter().position(|k| *k == key),
        };
        found.ok_or_else(|| ExpensiaError::UnknownRecord(target.to_string()))
    }

    /// Optimistic in-memory effect of a mutation.
    fn apply_local(&mut self, mutation: &PendingMutation) -> Result<()> {
        match mutation {
            PendingMutation::Add { key, fields } => {
                self.records.push(TransactionRecord::from_fields(None, fields));
                self.keys.push(*key);
                self.next_key = self.next_key.max(key.0 + 1);
            }
            PendingMutation::Edit { target, fields } => {
                let i = self.position_of(*target)?;
                let id = self.records[i].id;
                self.records[i] = TransactionRecord::from_fields(id, fields);
            }
            PendingMutation::Delete { target } => {
                let i = self.position_of(*target)?;
                self.records.remove(i);
                self.keys.remove(i);
            }
        }
        Ok(())
    }

    /// Flush the queue to `store` and re-list from it. Store failures land in
    /// the report; only a failed re-list is an error.
    pub fn save(&mut self, store: &mut dyn RecordStore) -> Result<FlushReport> {
        let report = self.queue.flush(store, self.flush_policy);
        self.load(store)?;
        Ok(report)
    }

    // --- accessors ---

    pub fn on_summary_changed(&mut self, listener: SummaryListener) {
        self.notifier.subscribe(listener);
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn integrity(&self) -> IntegrityReport {
        self.integrity
    }

    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    /// Records in visible order.
    pub fn visible_records(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.visible.iter().map(|&i| &self.records[i])
    }

    pub fn record_at(&self, position: usize) -> Option<&TransactionRecord> {
        self.visible.get(position).map(|&i| &self.records[i])
    }

    /// Stable handle for the row at visible `position`.
    pub fn record_ref_at(&self, position: usize) -> Option<RecordRef> {
        let &i = self.visible.get(position)?;
        Some(match self.records[i].id {
            Some(id) => RecordRef::Stored(id),
            None => RecordRef::Local(self.keys[i]),
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Bound slots in row order.
    pub fn bound_rows(&self) -> Vec<&RowViewSlot> {
        self.viewport.bound_slots()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending(&self) -> &[PendingMutation] {
        self.queue.pending()
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}
