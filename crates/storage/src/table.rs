//! Table: committed rows of the `test(id, name)` relation
//!
//! This module implements the committed state using:
//! - `BTreeMap<RowId, VersionedRow>` for ordered row storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for the global commit version
//! - `AtomicU64` for the row id sequence
//!
//! # Design Notes
//!
//! - **No version history**: each row stores only its latest committed value.
//!   Snapshots are clones, so old values stay reachable through them.
//! - **Row ids are a sequence**: ids handed to inserts that later abort are
//!   never reused, the same way a SQL sequence behaves.
//! - **Batch atomicity**: `apply_batch` holds the write lock for the whole
//!   batch, so no snapshot can observe half a commit.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use ssiprobe_core::{Predicate, Row, RowId};
use tracing::trace;

use crate::snapshot::TableSnapshot;

/// A committed row together with the commit version that last wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRow {
    /// Row contents
    pub row: Row,
    /// Commit version of the last write
    pub version: u64,
}

impl VersionedRow {
    /// Create a versioned row
    pub fn new(row: Row, version: u64) -> Self {
        Self { row, version }
    }
}

/// Buffered writes of one transaction, ready to apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    /// Rows whose name changes
    pub updates: Vec<(RowId, String)>,
    /// New rows (ids already allocated from the sequence)
    pub inserts: Vec<Row>,
    /// Rows to remove
    pub deletes: Vec<RowId>,
}

impl WriteBatch {
    /// Whether the batch holds no operation
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

/// Result of applying a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyResult {
    /// Version assigned to every row written by the batch
    pub commit_version: u64,
    /// Updates applied
    pub updates_applied: usize,
    /// Updates skipped because the row no longer exists
    pub updates_skipped: usize,
    /// Inserts applied
    pub inserts_applied: usize,
    /// Deletes applied
    pub deletes_applied: usize,
}

impl ApplyResult {
    /// Total number of row changes
    pub fn total_operations(&self) -> usize {
        self.updates_applied + self.inserts_applied + self.deletes_applied
    }
}

/// The committed `test` relation
///
/// Thread-safe through `parking_lot::RwLock` and atomics.
#[derive(Debug)]
pub struct Table {
    /// Committed rows
    data: RwLock<BTreeMap<RowId, VersionedRow>>,
    /// Version of the last applied batch
    version: AtomicU64,
    /// Next row id to hand out
    next_row_id: AtomicU64,
}

impl Table {
    /// Create an empty table at version 0
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            version: AtomicU64::new(0),
            next_row_id: AtomicU64::new(1),
        }
    }

    /// Version of the last applied batch
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate a row id from the sequence
    pub fn next_row_id(&self) -> RowId {
        RowId(self.next_row_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of committed rows
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the table has no committed row
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Latest committed state of one row
    pub fn get(&self, id: RowId) -> Option<VersionedRow> {
        self.data.read().get(&id).cloned()
    }

    /// Latest committed rows matching a predicate, in id order
    pub fn scan(&self, predicate: &Predicate) -> Vec<VersionedRow> {
        self.data
            .read()
            .values()
            .filter(|vr| predicate.matches(&vr.row.name))
            .cloned()
            .collect()
    }

    /// Create a snapshot of the current state
    ///
    /// Clones every row. O(n), acceptable for tables of a handful of rows.
    pub fn create_snapshot(&self) -> TableSnapshot {
        // Read the version under the lock so it matches the cloned rows.
        let data = self.data.read();
        let version = self.current_version();
        TableSnapshot::new(version, data.clone())
    }

    /// Apply a batch atomically at `version`
    ///
    /// Updates of rows that no longer exist are skipped and counted; callers
    /// that need stronger guarantees validate before applying.
    pub fn apply_batch(&self, batch: &WriteBatch, version: u64) -> ApplyResult {
        let mut data = self.data.write();
        let mut result = ApplyResult {
            commit_version: version,
            updates_applied: 0,
            updates_skipped: 0,
            inserts_applied: 0,
            deletes_applied: 0,
        };

        for (id, name) in &batch.updates {
            match data.get_mut(id) {
                Some(vr) => {
                    vr.row.name = name.clone();
                    vr.version = version;
                    result.updates_applied += 1;
                }
                None => {
                    trace!(target: "ssiprobe::store", row_id = %id, "update skipped, row gone");
                    result.updates_skipped += 1;
                }
            }
        }

        for row in &batch.inserts {
            data.insert(row.id, VersionedRow::new(row.clone(), version));
            result.inserts_applied += 1;
        }

        for id in &batch.deletes {
            if data.remove(id).is_some() {
                result.deletes_applied += 1;
            }
        }

        self.version.fetch_max(version, Ordering::SeqCst);
        result
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
