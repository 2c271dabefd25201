use tracing::debug;

use super::pool::{RenderedFields, RowViewPool, RowViewSlot};
use crate::models::TransactionRecord;

/// Inclusive range of visible-sequence indices, buffer rows included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub first: usize,
    pub last: usize,
}

/// Rows needed to cover `viewport_height`, counting a partially shown row.
pub fn visible_rows(viewport_height: u32, row_height: u32) -> usize {
    let row_height = row_height.max(1);
    viewport_height.div_ceil(row_height).max(1) as usize
}

/// Map a scroll position to the range of rows worth binding. `None` when
/// there is nothing to show. Never fails: offsets past the end clamp to the
/// last row.
pub fn compute_visible_range(
    scroll_offset: u32,
    row_height: u32,
    viewport_height: u32,
    total_rows: usize,
    buffer_rows: usize,
) -> Option<VisibleRange> {
    if total_rows == 0 {
        return None;
    }
    let row_height = row_height.max(1);
    let top = ((scroll_offset / row_height) as usize).min(total_rows - 1);
    let rows = visible_rows(viewport_height, row_height);
    Some(VisibleRange {
        first: top.saturating_sub(buffer_rows),
        last: (top + rows + buffer_rows - 1).min(total_rows - 1),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Passes that actually rebound slots.
    pub renders: u64,
    /// Slot bindings across all passes.
    pub rebinds: u64,
    /// Bindings whose text changed.
    pub redraws: u64,
}

/// Scroll position and slot binding for a fixed-row-height list.
#[derive(Debug)]
pub struct Viewport {
    row_height: u32,
    buffer_rows: usize,
    viewport_height: u32,
    scroll_offset: u32,
    pool: RowViewPool,
    last_rendered: Option<VisibleRange>,
    stale: bool,
    refresh_pending: bool,
    stats: RenderStats,
}

impl Viewport {
    pub fn new(row_height: u32, buffer_rows: usize, viewport_height: u32) -> Self {
        let row_height = row_height.max(1);
        let capacity = visible_rows(viewport_height, row_height) + 2 * buffer_rows;
        Self {
            row_height,
            buffer_rows,
            viewport_height,
            scroll_offset: 0,
            pool: RowViewPool::with_capacity(capacity),
            last_rendered: None,
            stale: true,
            refresh_pending: false,
            stats: RenderStats::default(),
        }
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn scroll_offset(&self) -> u32 {
        self.scroll_offset
    }

    pub fn visible_rows(&self) -> usize {
        visible_rows(self.viewport_height, self.row_height)
    }

    /// Height of the scrollable content. An empty table still scrolls over
    /// one row so the surface keeps a sane extent.
    pub fn scroll_height(&self, total_rows: usize) -> u32 {
        let rows = u32::try_from(total_rows).unwrap_or(u32::MAX);
        rows.saturating_mul(self.row_height).max(self.row_height)
    }

    pub fn max_scroll(&self, total_rows: usize) -> u32 {
        self.scroll_height(total_rows).saturating_sub(self.viewport_height)
    }

    /// Move to `offset`, clamped to the scrollable extent.
    pub fn scroll_to(&mut self, offset: u32, total_rows: usize) {
        self.scroll_offset = offset.min(self.max_scroll(total_rows));
    }

    /// Scroll by whole rows; negative moves up.
    pub fn scroll_by_rows(&mut self, rows: i64, total_rows: usize) {
        let delta = rows.saturating_mul(i64::from(self.row_height));
        let target = (i64::from(self.scroll_offset) + delta).clamp(0, i64::from(u32::MAX));
        self.scroll_to(target as u32, total_rows);
    }

    /// Record a new viewport height. The pool grows now; the re-render waits
    /// for `take_refresh` so a burst of resizes costs one pass.
    pub fn resize(&mut self, viewport_height: u32) {
        if viewport_height == self.viewport_height {
            return;
        }
        self.viewport_height = viewport_height;
        self.pool
            .resize(visible_rows(viewport_height, self.row_height) + 2 * self.buffer_rows);
        self.refresh_pending = true;
    }

    /// Consume a pending deferred refresh. Returns whether one was pending.
    pub fn take_refresh(&mut self) -> bool {
        let pending = self.refresh_pending;
        if pending {
            self.refresh_pending = false;
            self.stale = true;
        }
        pending
    }

    /// Force the next `render` to rebind even if the range is unchanged.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn current_range(&self, total_rows: usize) -> Option<VisibleRange> {
        compute_visible_range(
            self.scroll_offset,
            self.row_height,
            self.viewport_height,
            total_rows,
            self.buffer_rows,
        )
    }

    /// Bind slots to the rows of `visible` in the current range. Skips all
    /// work when the range matches the last pass and nothing invalidated it.
    /// Returns whether slots were rebound.
    pub fn render(&mut self, records: &[TransactionRecord], visible: &[usize], currency: &str) -> bool {
        self.scroll_to(self.scroll_offset, visible.len());
        let range = self.current_range(visible.len());
        if !self.stale && range == self.last_rendered {
            return false;
        }

        self.pool.unbind_all();
        if let Some(range) = range {
            let end = range.last.min(range.first + self.pool.capacity().saturating_sub(1));
            for (slot, index) in (range.first..=end).enumerate() {
                let record = &records[visible[index]];
                let y = u32::try_from(index)
                    .unwrap_or(u32::MAX)
                    .saturating_mul(self.row_height);
                if self.pool.bind(slot, index, y, RenderedFields::of(record, currency)) {
                    self.stats.redraws += 1;
                }
                self.stats.rebinds += 1;
            }
        }

        self.stats.renders += 1;
        self.last_rendered = range;
        self.stale = false;
        debug!(?range, bound = self.pool.bound_count(), "rendered viewport");
        true
    }

    /// Bound slots ordered by their row index.
    pub fn bound_slots(&self) -> Vec<&RowViewSlot> {
        let mut bound: Vec<&RowViewSlot> = self.pool.bound_slots().collect();
        bound.sort_by_key(|s| s.bound_index());
        bound
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<TransactionRecord> {
        (0..n)
            .map(|i| TransactionRecord {
                id: Some(i as i64 + 1),
                date: "2024-01-01".to_string(),
                amount: Some(i as f64),
                tag: format!("t{i}"),
                description: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_range_at_top() {
        let r = compute_visible_range(0, 40, 400, 1000, 3).unwrap();
        assert_eq!(r, VisibleRange { first: 0, last: 12 });
    }

    #[test]
    fn test_range_mid_list_has_buffer_both_sides() {
        let r = compute_visible_range(4000, 40, 400, 1000, 3).unwrap();
        assert_eq!(r, VisibleRange { first: 97, last: 112 });
        assert_eq!(r.last - r.first + 1, 10 + 2 * 3);
    }

    #[test]
    fn test_range_clamps_past_end() {
        let r = compute_visible_range(1_000_000, 40, 400, 50, 3).unwrap();
        assert_eq!(r.last, 49);
        assert!(r.first <= r.last);
    }

    #[test]
    fn test_range_of_empty_sequence() {
        assert_eq!(compute_visible_range(0, 40, 400, 0, 3), None);
    }

    #[test]
    fn test_partial_row_counts_as_visible() {
        assert_eq!(visible_rows(401, 40), 11);
        assert_eq!(visible_rows(0, 40), 1);
        assert_eq!(visible_rows(10, 0), 10);
    }

    #[test]
    fn test_pool_stays_bounded_while_scrolling() {
        let recs = records(500);
        let visible: Vec<usize> = (0..recs.len()).collect();
        let mut vp = Viewport::new(1, 3, 20);
        let bound = vp.visible_rows() + 2 * 3;
        for offset in (0..600).step_by(7) {
            vp.scroll_to(offset, visible.len());
            vp.render(&recs, &visible, "$");
            assert!(vp.bound_slots().len() <= bound);
            assert_eq!(vp.pool.capacity(), bound);
        }
    }

    #[test]
    fn test_render_is_noop_for_unchanged_range() {
        let recs = records(100);
        let visible: Vec<usize> = (0..recs.len()).collect();
        let mut vp = Viewport::new(1, 3, 10);
        assert!(vp.render(&recs, &visible, "$"));
        let before = vp.stats();
        assert!(!vp.render(&recs, &visible, "$"));
        assert_eq!(vp.stats(), before);

        vp.invalidate();
        assert!(vp.render(&recs, &visible, "$"));
        assert_eq!(vp.stats().renders, before.renders + 1);
        // Same rows, same text: nothing redrawn.
        assert_eq!(vp.stats().redraws, before.redraws);
    }

    #[test]
    fn test_slots_are_positioned_by_index() {
        let recs = records(100);
        let visible: Vec<usize> = (0..recs.len()).collect();
        let mut vp = Viewport::new(2, 1, 10);
        vp.scroll_to(40, visible.len());
        vp.render(&recs, &visible, "$");
        let bound = vp.bound_slots();
        assert_eq!(bound[0].bound_index(), Some(19));
        assert_eq!(bound[0].y(), 38);
        assert_eq!(bound[0].fields().tag, "t19");
    }

    #[test]
    fn test_resize_defers_render() {
        let recs = records(100);
        let visible: Vec<usize> = (0..recs.len()).collect();
        let mut vp = Viewport::new(1, 3, 10);
        vp.render(&recs, &visible, "$");
        let renders = vp.stats().renders;

        vp.resize(30);
        vp.resize(25);
        vp.resize(40);
        assert_eq!(vp.stats().renders, renders);
        assert!(vp.refresh_pending);

        assert!(vp.take_refresh());
        assert!(!vp.take_refresh());
        vp.render(&recs, &visible, "$");
        assert_eq!(vp.stats().renders, renders + 1);
        assert_eq!(vp.bound_slots().len(), 40 + 3);
    }

    #[test]
    fn test_empty_sequence_unbinds_and_keeps_min_height() {
        let recs = records(10);
        let visible: Vec<usize> = (0..recs.len()).collect();
        let mut vp = Viewport::new(1, 3, 5);
        vp.render(&recs, &visible, "$");
        assert!(!vp.bound_slots().is_empty());

        vp.invalidate();
        vp.render(&recs, &[], "$");
        assert!(vp.bound_slots().is_empty());
        assert_eq!(vp.scroll_height(0), 1);
        assert_eq!(vp.max_scroll(0), 0);
    }

    #[test]
    fn test_scroll_offset_is_clamped() {
        let mut vp = Viewport::new(1, 3, 10);
        vp.scroll_to(500, 25);
        assert_eq!(vp.scroll_offset(), 15);
        vp.scroll_by_rows(-100, 25);
        assert_eq!(vp.scroll_offset(), 0);
        vp.scroll_by_rows(3, 25);
        assert_eq!(vp.scroll_offset(), 3);
    }
}
