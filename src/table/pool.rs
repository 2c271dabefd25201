use crate::fmt::money;
use crate::models::TransactionRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmountTone {
    #[default]
    Unknown,
    Income,
    Expense,
}

/// Text and tone last written into a slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedFields {
    pub date: String,
    pub amount: String,
    pub tag: String,
    pub description: String,
    pub tone: AmountTone,
}

impl RenderedFields {
    pub fn of(record: &TransactionRecord, currency: &str) -> Self {
        let (amount, tone) = match record.amount {
            Some(a) if a < 0.0 => (money(a, currency), AmountTone::Expense),
            Some(a) => (money(a, currency), AmountTone::Income),
            None => ("?".to_string(), AmountTone::Unknown),
        };
        Self {
            date: record.date.clone(),
            amount,
            tag: record.tag.clone(),
            description: record.description.clone(),
            tone,
        }
    }
}

/// One reusable row view. Lives as long as the pool.
#[derive(Debug, Clone, Default)]
pub struct RowViewSlot {
    bound_index: Option<usize>,
    y: u32,
    rendered: RenderedFields,
}

impl RowViewSlot {
    /// Index into the visible sequence, `None` when hidden.
    pub fn bound_index(&self) -> Option<usize> {
        self.bound_index
    }

    pub fn is_bound(&self) -> bool {
        self.bound_index.is_some()
    }

    /// Vertical position in content coordinates.
    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn fields(&self) -> &RenderedFields {
        &self.rendered
    }

    fn unbind(&mut self) {
        self.bound_index = None;
    }

    /// Returns whether the displayed text actually changed.
    fn bind(&mut self, index: usize, y: u32, fields: RenderedFields) -> bool {
        self.bound_index = Some(index);
        self.y = y;
        if self.rendered == fields {
            return false;
        }
        self.rendered = fields;
        true
    }
}

/// Arena of row slots addressed by position.
#[derive(Debug, Clone, Default)]
pub struct RowViewPool {
    slots: Vec<RowViewSlot>,
}

impl RowViewPool {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut pool = Self::default();
        pool.resize(capacity);
        pool
    }

    /// Grow to at least `capacity` slots. Never shrinks, so a window that
    /// wobbles in size does not churn slots.
    pub fn resize(&mut self, capacity: usize) {
        if capacity > self.slots.len() {
            self.slots.resize_with(capacity, RowViewSlot::default);
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_bound()).count()
    }

    pub fn bound_slots(&self) -> impl Iterator<Item = &RowViewSlot> {
        self.slots.iter().filter(|s| s.is_bound())
    }

    pub fn unbind_all(&mut self) {
        for slot in &mut self.slots {
            slot.unbind();
        }
    }

    /// Bind slot `slot` to visible index `index`. Returns whether it redrew.
    /// Out-of-range slots are ignored.
    pub fn bind(&mut self, slot: usize, index: usize, y: u32, fields: RenderedFields) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => s.bind(index, y, fields),
            None => false,
        }
    }
}
