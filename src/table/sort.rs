use std::cmp::Ordering;

use crate::models::{is_canonical_date, TransactionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Date,
    Amount,
    Tag,
    Description,
}

impl SortColumn {
    pub fn label(self) -> &'static str {
        match self {
            SortColumn::Date => "Date",
            SortColumn::Amount => "Amount",
            SortColumn::Tag => "Tag",
            SortColumn::Description => "Description",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "date" => Some(SortColumn::Date),
            "amount" => Some(SortColumn::Amount),
            "tag" => Some(SortColumn::Tag),
            "description" | "desc" => Some(SortColumn::Description),
            _ => None,
        }
    }
}

/// Active sort column and direction. `column == None` keeps insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    /// Header click: reselecting the active column flips the direction, a new
    /// column starts ascending.
    pub fn select(&mut self, column: SortColumn) {
        if self.column == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column);
            self.ascending = true;
        }
    }

    pub fn indicator(&self, column: SortColumn) -> &'static str {
        match (self.column == Some(column), self.ascending) {
            (false, _) => "",
            (true, true) => " \u{25b2}",
            (true, false) => " \u{25bc}",
        }
    }
}

/// Precomputed comparison key. `None` (unreadable amount, malformed date)
/// orders before every real value.
#[derive(Debug)]
enum SortKey {
    Text(Option<String>),
    Number(Option<f64>),
}

impl SortKey {
    fn of(record: &TransactionRecord, column: SortColumn) -> Self {
        match column {
            SortColumn::Date => {
                SortKey::Text(is_canonical_date(&record.date).then(|| record.date.clone()))
            }
            SortColumn::Amount => SortKey::Number(record.amount),
            SortColumn::Tag => SortKey::Text(Some(record.tag.to_lowercase())),
            SortColumn::Description => SortKey::Text(Some(record.description.to_lowercase())),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(b),
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
            },
            // Keys for one pass always come from the same column.
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Less,
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Greater,
        }
    }
}

/// Stable sort of `visible` (indices into `records`) by one column.
/// Equal keys keep their incoming relative order in both directions.
pub fn sort(records: &[TransactionRecord], visible: &mut Vec<usize>, column: SortColumn, ascending: bool) {
    let mut keyed: Vec<(SortKey, usize)> = visible
        .iter()
        .map(|&i| (SortKey::of(&records[i], column), i))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| {
        let ord = a.compare(b);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });

    visible.clear();
    visible.extend(keyed.into_iter().map(|(_, i)| i));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, date: &str, amount: Option<f64>, tag: &str, desc: &str) -> TransactionRecord {
        TransactionRecord {
            id: Some(id),
            date: date.to_string(),
            amount,
            tag: tag.to_string(),
            description: desc.to_string(),
        }
    }

    fn ids(records: &[TransactionRecord], idx: &[usize]) -> Vec<i64> {
        idx.iter().filter_map(|&i| records[i].id).collect()
    }

    fn sorted(records: &[TransactionRecord], column: SortColumn, ascending: bool) -> Vec<usize> {
        let mut visible: Vec<usize> = (0..records.len()).collect();
        sort(records, &mut visible, column, ascending);
        visible
    }

    #[test]
    fn test_amount_ascending() {
        let records = vec![
            rec(1, "2024-01-15", Some(250.0), "Food", "Groceries"),
            rec(2, "2024-01-14", Some(-50.0), "Transport", "Gas"),
        ];
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Amount, true)), vec![2, 1]);
    }

    #[test]
    fn test_amount_is_numeric_not_lexicographic() {
        let records = vec![
            rec(1, "2024-01-01", Some(100.0), "a", ""),
            rec(2, "2024-01-01", Some(9.0), "a", ""),
            rec(3, "2024-01-01", Some(-1000.0), "a", ""),
        ];
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Amount, true)), vec![3, 2, 1]);
    }

    #[test]
    fn test_date_order_is_chronological() {
        let records = vec![
            rec(1, "2024-03-01", Some(1.0), "a", ""),
            rec(2, "2024-01-10", Some(1.0), "a", ""),
            rec(3, "2023-12-31", Some(1.0), "a", ""),
        ];
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Date, true)), vec![3, 2, 1]);
    }

    #[test]
    fn test_text_columns_ignore_case() {
        let records = vec![
            rec(1, "2024-01-01", Some(1.0), "banana", "Zed"),
            rec(2, "2024-01-01", Some(1.0), "Apple", "alpha"),
            rec(3, "2024-01-01", Some(1.0), "cherry", "Mid"),
        ];
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Tag, true)), vec![2, 1, 3]);
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Description, true)), vec![2, 3, 1]);
    }

    #[test]
    fn test_unparseable_keys_sort_as_minimum() {
        let records = vec![
            rec(1, "2024-01-01", Some(-500.0), "a", ""),
            rec(2, "not a date", None, "a", ""),
            rec(3, "2023-01-01", Some(5.0), "a", ""),
        ];
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Amount, true)), vec![2, 1, 3]);
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Date, true)), vec![2, 3, 1]);
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Amount, false)), vec![3, 1, 2]);
    }

    #[test]
    fn test_ties_keep_prior_order_in_both_directions() {
        let records = vec![
            rec(1, "2024-01-01", Some(10.0), "a", ""),
            rec(2, "2024-01-02", Some(10.0), "a", ""),
            rec(3, "2024-01-03", Some(5.0), "a", ""),
            rec(4, "2024-01-04", Some(10.0), "a", ""),
        ];
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Amount, true)), vec![3, 1, 2, 4]);
        assert_eq!(ids(&records, &sorted(&records, SortColumn::Amount, false)), vec![1, 2, 4, 3]);
    }

    #[test]
    fn test_resorting_same_key_is_idempotent() {
        let records = vec![
            rec(1, "2024-01-01", Some(10.0), "b", ""),
            rec(2, "2024-01-02", Some(10.0), "a", ""),
            rec(3, "2024-01-03", Some(5.0), "b", ""),
        ];
        let mut visible: Vec<usize> = (0..records.len()).collect();
        sort(&records, &mut visible, SortColumn::Tag, true);
        let once = visible.clone();
        sort(&records, &mut visible, SortColumn::Tag, true);
        assert_eq!(visible, once);
    }

    #[test]
    fn test_descending_reverses_distinct_keys() {
        let records = vec![
            rec(1, "2024-03-01", Some(1.0), "a", ""),
            rec(2, "2024-01-10", Some(2.0), "a", ""),
        ];
        let asc = sorted(&records, SortColumn::Date, true);
        let mut desc = sorted(&records, SortColumn::Date, false);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_select_toggles_and_resets() {
        let mut state = SortState::default();
        state.select(SortColumn::Date);
        assert_eq!(state, SortState { column: Some(SortColumn::Date), ascending: true });
        state.select(SortColumn::Date);
        assert!(!state.ascending);
        state.select(SortColumn::Amount);
        assert_eq!(state, SortState { column: Some(SortColumn::Amount), ascending: true });
    }

    #[test]
    fn test_parse_column() {
        assert_eq!(SortColumn::parse("Amount"), Some(SortColumn::Amount));
        assert_eq!(SortColumn::parse("desc"), Some(SortColumn::Description));
        assert_eq!(SortColumn::parse("id"), None);
    }
}
