use std::fmt;

/// Identifier assigned by the record store when a transaction is persisted.
pub type TransactionId = i64;

/// A transaction as held in memory by the table engine.
///
/// `amount` is `None` when the stored value could not be read as a number and
/// `date` is kept verbatim even when malformed, so anomalies in existing data
/// never drop a row.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub id: Option<TransactionId>,
    pub date: String,
    pub amount: Option<f64>,
    pub tag: String,
    pub description: String,
}

impl TransactionRecord {
    pub fn from_fields(id: Option<TransactionId>, fields: &TransactionFields) -> Self {
        Self {
            id,
            date: fields.date.clone(),
            amount: Some(fields.amount),
            tag: fields.tag.clone(),
            description: fields.description.clone(),
        }
    }

    /// Year and month slices of a well-formed `YYYY-MM-DD` date.
    pub fn year_month(&self) -> Option<(&str, &str)> {
        if !is_canonical_date(&self.date) {
            return None;
        }
        Some((&self.date[0..4], &self.date[5..7]))
    }
}

/// Validated field values for a create or update.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    pub date: String,
    pub amount: f64,
    pub tag: String,
    pub description: String,
}

/// Raw form input, exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionInput {
    pub date: String,
    pub amount: String,
    pub tag: String,
    pub description: String,
}

impl From<&TransactionRecord> for TransactionInput {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            date: record.date.clone(),
            amount: record.amount.map(|a| format!("{a:.2}")).unwrap_or_default(),
            tag: record.tag.clone(),
            description: record.description.clone(),
        }
    }
}

/// Engine-local handle for a row, stable across re-sorts and re-filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalKey(pub u64);

/// Target of an edit or delete: a persisted id, or a row added in this
/// session that the store has not assigned an id to yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordRef {
    Stored(TransactionId),
    Local(LocalKey),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Stored(id) => write!(f, "#{id}"),
            RecordRef::Local(key) => write!(f, "unsaved row {}", key.0),
        }
    }
}

/// Fixed-width, zero-padded `YYYY-MM-DD` shape check.
pub fn is_canonical_date(date: &str) -> bool {
    let b = date.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str) -> TransactionRecord {
        TransactionRecord {
            id: Some(1),
            date: date.to_string(),
            amount: Some(1.0),
            tag: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn test_canonical_date_shape() {
        assert!(is_canonical_date("2024-01-15"));
        assert!(!is_canonical_date("2024-1-15"));
        assert!(!is_canonical_date("15/01/2024"));
        assert!(!is_canonical_date("2024-01-15 "));
        assert!(!is_canonical_date(""));
    }

    #[test]
    fn test_year_month_of_malformed_date_is_none() {
        assert_eq!(record("2024-03-09").year_month(), Some(("2024", "03")));
        assert_eq!(record("19/21/2024").year_month(), None);
    }

    #[test]
    fn test_input_from_record_formats_amount() {
        let mut r = record("2024-03-09");
        r.amount = Some(-50.0);
        assert_eq!(TransactionInput::from(&r).amount, "-50.00");
        r.amount = None;
        assert_eq!(TransactionInput::from(&r).amount, "");
    }
}
