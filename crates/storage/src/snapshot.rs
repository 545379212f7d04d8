//! TableSnapshot: point-in-time view via clone
//!
//! # Design Notes
//!
//! - **Deep clone**: the row map is cloned once and shared behind an `Arc`
//! - **Immutable**: once created, the snapshot never changes
//! - **Thread-safe**: can be shared across threads

use std::collections::BTreeMap;
use std::sync::Arc;

use ssiprobe_core::{Predicate, RowId};

use crate::table::VersionedRow;

/// Immutable view of the committed table at one version
///
/// # Example
///
/// ```ignore
/// let table = Table::new();
/// let snapshot = table.create_snapshot();
///
/// // Batches applied after snapshot creation are not visible
/// table.apply_batch(&batch, 1);
/// assert!(snapshot.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    /// Table version when the snapshot was taken
    version: u64,
    /// Cloned rows
    data: Arc<BTreeMap<RowId, VersionedRow>>,
}

impl TableSnapshot {
    /// Create a snapshot from cloned rows
    ///
    /// Typically called by `Table::create_snapshot()`, not directly.
    pub fn new(version: u64, data: BTreeMap<RowId, VersionedRow>) -> Self {
        Self {
            version,
            data: Arc::new(data),
        }
    }

    /// Create an empty snapshot at a given version
    pub fn empty(version: u64) -> Self {
        Self::new(version, BTreeMap::new())
    }

    /// Table version the snapshot reflects
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of rows in the snapshot
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the snapshot has no rows
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// One row, if it existed at snapshot time
    pub fn get(&self, id: RowId) -> Option<&VersionedRow> {
        self.data.get(&id)
    }

    /// Rows matching a predicate, in id order
    pub fn scan<'a>(
        &'a self,
        predicate: &'a Predicate,
    ) -> impl Iterator<Item = &'a VersionedRow> + 'a {
        self.data
            .values()
            .filter(move |vr| predicate.matches(&vr.row.name))
    }
}
