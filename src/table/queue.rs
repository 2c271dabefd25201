use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ExpensiaError, Result};
use crate::models::{LocalKey, RecordRef, TransactionFields, TransactionId};
use crate::store::RecordStore;

/// One user intent waiting to reach the store.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingMutation {
    Add { key: LocalKey, fields: TransactionFields },
    Edit { target: RecordRef, fields: TransactionFields },
    Delete { target: RecordRef },
}

impl fmt::Display for PendingMutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingMutation::Add { fields, .. } => {
                write!(f, "add {} {:.2} {}", fields.date, fields.amount, fields.tag)
            }
            PendingMutation::Edit { target, .. } => write!(f, "edit {target}"),
            PendingMutation::Delete { target } => write!(f, "delete {target}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueState {
    #[default]
    Empty,
    Accumulating,
    Flushing,
}

/// What happens to mutations the store rejected during a flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushPolicy {
    /// Report and drop them.
    #[default]
    Discard,
    /// Report them and keep them queued for the next flush.
    Requeue,
}

impl FlushPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Some(FlushPolicy::Discard),
            "requeue" => Some(FlushPolicy::Requeue),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct FlushFailure {
    pub mutation: PendingMutation,
    pub error: ExpensiaError,
}

#[derive(Debug, Default)]
pub struct FlushReport {
    pub applied: usize,
    pub failures: Vec<FlushFailure>,
    /// Mutations kept for the next flush under [FlushPolicy::Requeue].
    pub requeued: usize,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.applied + self.failures.len()
    }
}

/// Ordered outbox of pending mutations. Replayed in enqueue order, no
/// coalescing.
#[derive(Debug, Default)]
pub struct MutationQueue {
    pending: Vec<PendingMutation>,
    state: QueueState,
}

impl MutationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> &[PendingMutation] {
        &self.pending
    }

    pub fn enqueue(&mut self, mutation: PendingMutation) -> Result<()> {
        if self.state == QueueState::Flushing {
            return Err(ExpensiaError::QueueBusy);
        }
        self.pending.push(mutation);
        self.state = QueueState::Accumulating;
        Ok(())
    }

    fn begin_flush(&mut self) -> Vec<PendingMutation> {
        self.state = QueueState::Flushing;
        std::mem::take(&mut self.pending)
    }

    fn finish_flush(&mut self, retained: Vec<PendingMutation>) {
        self.pending = retained;
        self.state = if self.pending.is_empty() {
            QueueState::Empty
        } else {
            QueueState::Accumulating
        };
    }

    /// Apply every pending mutation to `store` in order. Each one is attempted
    /// even after an earlier failure; failures come back together in the
    /// report. The queue ends empty unless `policy` requeues failures.
    pub fn flush(&mut self, store: &mut dyn RecordStore, policy: FlushPolicy) -> FlushReport {
        let batch = self.begin_flush();
        let mut report = FlushReport::default();
        let mut created: HashMap<LocalKey, TransactionId> = HashMap::new();
        let mut retained = Vec::new();

        for mutation in batch {
            match apply(store, &mutation, &mut created) {
                Ok(()) => report.applied += 1,
                Err(error) => {
                    warn!(%mutation, %error, "store rejected mutation");
                    if policy == FlushPolicy::Requeue {
                        retained.push(resolve_targets(&mutation, &created));
                    }
                    report.failures.push(FlushFailure { mutation, error });
                }
            }
        }

        report.requeued = retained.len();
        self.finish_flush(retained);
        info!(
            applied = report.applied,
            failed = report.failures.len(),
            requeued = report.requeued,
            "flushed mutation queue"
        );
        report
    }
}

fn resolve(target: RecordRef, created: &HashMap<LocalKey, TransactionId>) -> Result<TransactionId> {
    match target {
        RecordRef::Stored(id) => Ok(id),
        RecordRef::Local(key) => created
            .get(&key)
            .copied()
            .ok_or_else(|| ExpensiaError::UnknownRecord(target.to_string())),
    }
}

fn apply(
    store: &mut dyn RecordStore,
    mutation: &PendingMutation,
    created: &mut HashMap<LocalKey, TransactionId>,
) -> Result<()> {
    match mutation {
        PendingMutation::Add { key, fields } => {
            let id = store.create(fields)?;
            created.insert(*key, id);
        }
        PendingMutation::Edit { target, fields } => store.update(resolve(*target, created)?, fields)?,
        PendingMutation::Delete { target } => store.delete(resolve(*target, created)?)?,
    }
    Ok(())
}

/// Point local targets at ids created earlier in the same flush, so a retry
/// does not depend on an add that already went through.
fn resolve_targets(mutation: &PendingMutation, created: &HashMap<LocalKey, TransactionId>) -> PendingMutation {
    let rewrite = |target: RecordRef| match target {
        RecordRef::Local(key) => created.get(&key).map_or(target, |&id| RecordRef::Stored(id)),
        stored => stored,
    };
    match mutation {
        PendingMutation::Add { .. } => mutation.clone(),
        PendingMutation::Edit { target, fields } => PendingMutation::Edit {
            target: rewrite(*target),
            fields: fields.clone(),
        },
        PendingMutation::Delete { target } => PendingMutation::Delete { target: rewrite(*target) },
    }
}
