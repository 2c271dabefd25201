use std::collections::HashSet;

use crate::error::{ExpensiaError, Result};
use crate::models::{TransactionFields, TransactionId, TransactionRecord};
use crate::store::RecordStore;

/// In-memory store with injectable failures for exercising flush paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<TransactionRecord>,
    next_id: TransactionId,
    failing_updates: HashSet<TransactionId>,
    failing_deletes: HashSet<TransactionId>,
    failing_list: bool,
    delete_calls: Vec<TransactionId>,
}

impl MemoryStore {
    pub fn with_records(rows: Vec<(TransactionId, TransactionFields)>) -> Self {
        let next_id = rows.iter().map(|(id, _)| *id).max().unwrap_or(0);
        let records = rows
            .iter()
            .map(|(id, fields)| TransactionRecord::from_fields(Some(*id), fields))
            .collect();
        Self { records, next_id, ..Default::default() }
    }

    /// Push a record as-is, anomalies included.
    pub fn insert_raw(&mut self, record: TransactionRecord) {
        if let Some(id) = record.id {
            self.next_id = self.next_id.max(id);
        }
        self.records.push(record);
    }

    pub fn fail_on_update(&mut self, id: TransactionId) {
        self.failing_updates.insert(id);
    }

    pub fn fail_on_delete(&mut self, id: TransactionId) {
        self.failing_deletes.insert(id);
    }

    pub fn fail_list(&mut self) {
        self.failing_list = true;
    }

    pub fn clear_failures(&mut self) {
        self.failing_updates.clear();
        self.failing_deletes.clear();
        self.failing_list = false;
    }

    /// Ids passed to `delete`, in call order, failed calls included.
    pub fn delete_calls(&self) -> &[TransactionId] {
        &self.delete_calls
    }

    fn position(&self, id: TransactionId) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == Some(id))
            .ok_or(ExpensiaError::NotFound(id))
    }
}

fn injected() -> ExpensiaError {
    ExpensiaError::Other("injected store failure".to_string())
}

impl RecordStore for MemoryStore {
    fn list(&self) -> Result<Vec<TransactionRecord>> {
        if self.failing_list {
            return Err(injected());
        }
        Ok(self.records.clone())
    }

    fn create(&mut self, fields: &TransactionFields) -> Result<TransactionId> {
        self.next_id += 1;
        self.records
            .push(TransactionRecord::from_fields(Some(self.next_id), fields));
        Ok(self.next_id)
    }

    fn update(&mut self, id: TransactionId, fields: &TransactionFields) -> Result<()> {
        if self.failing_updates.contains(&id) {
            return Err(injected());
        }
        let pos = self.position(id)?;
        self.records[pos] = TransactionRecord::from_fields(Some(id), fields);
        Ok(())
    }

    fn delete(&mut self, id: TransactionId) -> Result<()> {
        self.delete_calls.push(id);
        if self.failing_deletes.contains(&id) {
            return Err(injected());
        }
        let pos = self.position(id)?;
        self.records.remove(pos);
        Ok(())
    }
}
