use crate::models::TransactionRecord;

/// Aggregates over the visible sequence. Always produced whole.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub income: f64,
    /// Sum of negative amounts, kept negative.
    pub expense: f64,
    pub balance: f64,
}

/// Sum the visible rows. Rows with an unreadable amount are counted but add
/// nothing to the totals.
pub fn summarize(records: &[TransactionRecord], visible: &[usize]) -> Summary {
    let mut income = 0.0;
    let mut expense = 0.0;
    for amount in visible.iter().filter_map(|&i| records[i].amount) {
        if amount >= 0.0 {
            income += amount;
        } else {
            expense += amount;
        }
    }
    Summary {
        count: visible.len(),
        income,
        expense,
        balance: income + expense,
    }
}

pub type SummaryListener = Box<dyn FnMut(&Summary)>;

/// Display-surface callbacks fired when the summary changes.
#[derive(Default)]
pub struct SummaryNotifier {
    listeners: Vec<SummaryListener>,
    last: Option<Summary>,
}

impl SummaryNotifier {
    pub fn subscribe(&mut self, listener: SummaryListener) {
        self.listeners.push(listener);
    }

    /// Deliver `summary` to every listener unless it equals the last one sent.
    /// Returns whether a notification went out.
    pub fn publish(&mut self, summary: Summary) -> bool {
        if self.last == Some(summary) {
            return false;
        }
        self.last = Some(summary);
        for listener in &mut self.listeners {
            listener(&summary);
        }
        true
    }
}
