//! Per-record bookkeeping for background writes.
//!
//! Every write the controller issues gets a sequence number. A record's
//! reported status follows the most recently issued write that has finished,
//! so an older request that fails after a newer one succeeded does not mark
//! the record failed.

use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::models::{Comment, CommentId, CommentPatch, NewComment};
use crate::store::CommentStore;

/// Persistence state of one comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Insert issued, backend id not known yet
    PendingCreate,
    /// One or more writes in flight
    Pending,
    /// Last completed write succeeded
    Synced,
    /// Last completed write failed; local state was kept
    Failed(String),
}

/// Kind of background write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
    Delete,
    Import,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
        })
    }
}

/// A write to mirror to the store
#[derive(Debug, Clone)]
pub(crate) enum WriteOp {
    Create(NewComment),
    Update { id: CommentId, patch: CommentPatch },
    Delete { id: CommentId },
    Import(Vec<Comment>),
}

impl WriteOp {
    pub(crate) const fn kind(&self) -> WriteKind {
        match self {
            Self::Create(_) => WriteKind::Create,
            Self::Update { .. } => WriteKind::Update,
            Self::Delete { .. } => WriteKind::Delete,
            Self::Import(_) => WriteKind::Import,
        }
    }

    pub(crate) async fn run<S: CommentStore>(self, store: &S) -> Result<Option<Comment>> {
        match self {
            Self::Create(comment) => store.insert(&comment).await.map(Some),
            Self::Update { id, patch } => store.update_fields(&id, &patch).await.map(|()| None),
            Self::Delete { id } => store.delete_by_id(&id).await.map(|()| None),
            Self::Import(comments) => store.import(&comments).await.map(|()| None),
        }
    }
}

/// Result of a background write, reported back to the controller
#[derive(Debug)]
pub(crate) struct SyncOutcome {
    /// Records the write was issued for, keyed as they were at issue time
    pub ids: Vec<CommentId>,
    pub seq: u64,
    pub kind: WriteKind,
    pub result: std::result::Result<Option<Comment>, String>,
}

/// How a local mutation of a record should reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    /// Record exists in the store; write by id
    Durable,
    /// Insert still in flight; remember and flush after reconciliation
    Creating,
    /// Insert failed or never happened; keep the change local
    LocalOnly,
}

#[derive(Debug, Default)]
struct RecordSync {
    durable: bool,
    in_flight: usize,
    last_completed: u64,
    error: Option<String>,
    dirty: bool,
    deleted: bool,
}

/// Flags carried over when a provisional record is matched to its durable id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Reconciled {
    pub dirty: bool,
    pub deleted: bool,
}

#[derive(Debug, Default)]
pub(crate) struct SyncTracker {
    records: HashMap<CommentId, RecordSync>,
    next_seq: u64,
    in_flight: usize,
}

impl SyncTracker {
    pub fn status(&self, id: &CommentId) -> Option<SyncStatus> {
        let record = self.records.get(id)?;
        let status = if !record.durable && record.in_flight > 0 {
            SyncStatus::PendingCreate
        } else if record.in_flight > 0 {
            SyncStatus::Pending
        } else if let Some(error) = &record.error {
            SyncStatus::Failed(error.clone())
        } else {
            SyncStatus::Synced
        };
        Some(status)
    }

    /// Writes issued and not yet reported back
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn mark_durable(&mut self, id: &CommentId) {
        let record = self.records.entry(id.clone()).or_default();
        record.durable = true;
        record.deleted = false;
    }

    pub fn write_mode(&self, id: &CommentId) -> WriteMode {
        match self.records.get(id) {
            Some(record) if record.durable => WriteMode::Durable,
            Some(record) if record.in_flight > 0 => WriteMode::Creating,
            _ => WriteMode::LocalOnly,
        }
    }

    /// Fields changed while the insert runs. The record is live, so a
    /// pending delete is dropped.
    pub fn mark_dirty(&mut self, id: &CommentId) {
        if let Some(record) = self.records.get_mut(id) {
            record.dirty = true;
            record.deleted = false;
        }
    }

    pub fn mark_deleted(&mut self, id: &CommentId) {
        if let Some(record) = self.records.get_mut(id) {
            record.deleted = true;
        }
    }

    pub fn forget(&mut self, id: &CommentId) {
        self.records.remove(id);
    }

    /// Register a write for `ids` and return its sequence number
    pub fn begin(&mut self, ids: &[CommentId]) -> u64 {
        self.next_seq += 1;
        self.in_flight += 1;
        for id in ids {
            self.records.entry(id.clone()).or_default().in_flight += 1;
        }
        self.next_seq
    }

    /// Record a finished write
    pub fn finish(&mut self, outcome: &SyncOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let error = outcome.result.as_ref().err();

        for id in &outcome.ids {
            let Some(record) = self.records.get_mut(id) else {
                continue;
            };
            record.in_flight = record.in_flight.saturating_sub(1);
            if outcome.seq >= record.last_completed {
                record.last_completed = outcome.seq;
                record.error = error.cloned();
            }

            // A successful insert still has to be reconciled before a pending
            // delete can go out.
            let done = match outcome.kind {
                WriteKind::Create => error.is_some(),
                _ => record.error.is_none(),
            };
            if record.deleted && record.in_flight == 0 && done {
                self.records.remove(id);
            }
        }
    }

    /// Move the entry for a provisional id to the backend's id and mark it
    /// durable. Returns what happened to the record while the insert ran.
    pub fn reconcile(&mut self, provisional: &CommentId, durable: &CommentId) -> Reconciled {
        let mut record = self.records.remove(provisional).unwrap_or_default();
        let reconciled = Reconciled {
            dirty: std::mem::take(&mut record.dirty),
            deleted: record.deleted,
        };
        record.durable = true;
        self.records.insert(durable.clone(), record);
        reconciled
    }
}
