//! Transaction validation for OCC
//!
//! This module implements commit-time conflict detection. Which checks run
//! depends on the isolation level of the committing transaction:
//!
//! | Level | Predicate reads | Write set |
//! |---|---|---|
//! | `ReadCommitted` | - | - |
//! | `RepeatableRead` | - | yes |
//! | `Serializable` | yes | yes |
//!
//! Key rules:
//! - First-committer-wins: validation compares against the committed table,
//!   so the second of two conflicting committers is the one that aborts
//! - Read-only transactions always commit, even under `Serializable`
//! - Write skew is allowed under `RepeatableRead` and rejected under
//!   `Serializable`, because only the latter re-checks what was read
//!
//! Validation is conservative: a predicate whose result set changed in any
//! way counts as a conflict, even if no serial order would actually need
//! the abort.

use crate::transaction::{PendingUpdate, PredicateRead, TransactionContext};
use ssiprobe_core::{IsolationLevel, Predicate, RowId};
use ssiprobe_storage::Table;
use std::collections::BTreeMap;

/// Types of conflicts that can occur during transaction validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// A row observed through a predicate changed or disappeared
    ///
    /// `current_version` is `None` when the row no longer exists or no
    /// longer satisfies the predicate.
    ReadWriteConflict {
        /// Predicate that observed the row
        predicate: Predicate,
        /// Row that changed
        row_id: RowId,
        /// Version observed at read time
        read_version: u64,
        /// Committed version at validation time, if still matching
        current_version: Option<u64>,
    },

    /// A committed row now satisfies a predicate that did not see it
    PhantomConflict {
        /// Predicate that missed the row
        predicate: Predicate,
        /// Row that appeared
        row_id: RowId,
    },

    /// A row this transaction writes was changed by a concurrent commit
    WriteWriteConflict {
        /// Row written by both transactions
        row_id: RowId,
        /// Version of the row when this transaction wrote it
        base_version: u64,
        /// Committed version at validation time (`None` if deleted)
        current_version: Option<u64>,
    },
}

/// Result of transaction validation
///
/// Accumulates all conflicts found during validation.
/// A transaction commits only if is_valid() returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// Create a successful validation result (no conflicts)
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// Create a validation result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Check if validation passed (no conflicts)
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Get the number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }
}

/// Re-evaluate predicate reads against the committed table
///
/// For each read, the set of committed rows satisfying the predicate must be
/// exactly the observed set, at the observed versions.
pub fn validate_predicate_reads(reads: &[PredicateRead], table: &Table) -> ValidationResult {
    let mut result = ValidationResult::ok();

    for read in reads {
        let current: BTreeMap<RowId, u64> = table
            .scan(&read.predicate)
            .into_iter()
            .map(|vr| (vr.row.id, vr.version))
            .collect();

        for (row_id, read_version) in &read.observed {
            let current_version = current.get(row_id).copied();
            if current_version != Some(*read_version) {
                result.conflicts.push(ConflictType::ReadWriteConflict {
                    predicate: read.predicate.clone(),
                    row_id: *row_id,
                    read_version: *read_version,
                    current_version,
                });
            }
        }

        for row_id in current.keys() {
            if !read.observed.contains_key(row_id) {
                result.conflicts.push(ConflictType::PhantomConflict {
                    predicate: read.predicate.clone(),
                    row_id: *row_id,
                });
            }
        }
    }

    result
}

/// Check that rows this transaction updates or deletes were not changed
/// by a concurrent commit
pub fn validate_write_set(
    updates: &BTreeMap<RowId, PendingUpdate>,
    deletes: &BTreeMap<RowId, u64>,
    table: &Table,
) -> ValidationResult {
    let mut result = ValidationResult::ok();

    let written = updates
        .iter()
        .map(|(id, u)| (*id, u.base_version))
        .chain(deletes.iter().map(|(id, v)| (*id, *v)));

    for (row_id, base_version) in written {
        let current_version = table.get(row_id).map(|vr| vr.version);
        if current_version != Some(base_version) {
            result.conflicts.push(ConflictType::WriteWriteConflict {
                row_id,
                base_version,
                current_version,
            });
        }
    }

    result
}

/// Validate a transaction according to its isolation level
///
/// Must be called while holding the manager's commit lock, so no other
/// commit can interleave between validation and apply.
pub fn validate_transaction(txn: &TransactionContext, table: &Table) -> ValidationResult {
    match txn.isolation {
        IsolationLevel::ReadCommitted => ValidationResult::ok(),
        IsolationLevel::RepeatableRead => validate_write_set(&txn.updates, &txn.deletes, table),
        IsolationLevel::Serializable => {
            if txn.is_read_only() {
                return ValidationResult::ok();
            }
            let mut result = validate_predicate_reads(&txn.predicate_reads, table);
            result.merge(validate_write_set(&txn.updates, &txn.deletes, table));
            result
        }
    }
}
