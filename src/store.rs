use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Connection};

use crate::db::{get_connection, init_db};
use crate::error::{ExpensiaError, Result};
use crate::fmt::parse_amount;
use crate::models::{TransactionFields, TransactionId, TransactionRecord};

/// Durable home of transaction records. The table engine only talks to
/// storage through this trait.
pub trait RecordStore {
    /// Every stored record in insertion order.
    fn list(&self) -> Result<Vec<TransactionRecord>>;

    /// Persist a new record and return its id.
    fn create(&mut self, fields: &TransactionFields) -> Result<TransactionId>;

    /// Overwrite record `id`. Missing ids are [ExpensiaError::NotFound].
    fn update(&mut self, id: TransactionId, fields: &TransactionFields) -> Result<()>;

    /// Remove record `id`. Missing ids are [ExpensiaError::NotFound].
    fn delete(&mut self, id: TransactionId) -> Result<()>;
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = get_connection(path)?;
        init_db(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Read a stored amount whatever SQLite handed back. Text written by older
/// tools may carry a currency sign or separators.
fn amount_from_value(value: Value) -> Option<f64> {
    match value {
        Value::Real(f) if f.is_finite() => Some(f),
        Value::Integer(i) => Some(i as f64),
        Value::Text(s) => parse_amount(&s),
        _ => None,
    }
}

impl RecordStore for SqliteStore {
    fn list(&self) -> Result<Vec<TransactionRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, date, amount, tag, description FROM transactions ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(TransactionRecord {
                id: Some(row.get(0)?),
                date: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                amount: amount_from_value(row.get(2)?),
                tag: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                description: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn create(&mut self, fields: &TransactionFields) -> Result<TransactionId> {
        self.conn.execute(
            "INSERT INTO transactions (date, amount, tag, description) VALUES (?1, ?2, ?3, ?4)",
            params![fields.date, fields.amount, fields.tag, fields.description],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update(&mut self, id: TransactionId, fields: &TransactionFields) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE transactions SET date = ?1, amount = ?2, tag = ?3, description = ?4 WHERE id = ?5",
            params![fields.date, fields.amount, fields.tag, fields.description, id],
        )?;
        if changed == 0 {
            return Err(ExpensiaError::NotFound(id));
        }
        Ok(())
    }

    fn delete(&mut self, id: TransactionId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(ExpensiaError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn fields(date: &str, amount: f64, tag: &str) -> TransactionFields {
        TransactionFields {
            date: date.to_string(),
            amount,
            tag: tag.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_create_and_list() {
        let (_dir, mut store) = test_store();
        let a = store.create(&fields("2024-01-15", 250.0, "Food")).unwrap();
        let b = store.create(&fields("2024-01-14", -50.0, "Transport")).unwrap();
        assert!(b > a);

        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, Some(a));
        assert_eq!(records[1].amount, Some(-50.0));
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, mut store) = test_store();
        let id = store.create(&fields("2024-01-15", 250.0, "Food")).unwrap();
        store.update(id, &fields("2024-01-16", 10.0, "Snacks")).unwrap();
        let records = store.list().unwrap();
        assert_eq!(records[0].tag, "Snacks");

        store.delete(id).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let (_dir, mut store) = test_store();
        assert!(matches!(
            store.update(99, &fields("2024-01-15", 1.0, "x")),
            Err(ExpensiaError::NotFound(99))
        ));
        assert!(matches!(store.delete(99), Err(ExpensiaError::NotFound(99))));
    }

    #[test]
    fn test_decorated_and_corrupt_amounts_are_tolerated() {
        let (_dir, store) = test_store();
        store
            .conn()
            .execute_batch(
                "INSERT INTO transactions (date, amount, tag) VALUES ('2024-01-01', '€1,250.50', 'a');
                 INSERT INTO transactions (date, amount, tag) VALUES ('2024-01-02', 'n/a', 'b');
                 INSERT INTO transactions (date, amount, tag) VALUES ('2024-01-03', NULL, 'c');
                 INSERT INTO transactions (date, amount, tag) VALUES ('2024-01-04', 7, 'd');",
            )
            .unwrap();
        let amounts: Vec<Option<f64>> = store.list().unwrap().iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![Some(1250.5), None, None, Some(7.0)]);
    }
}
