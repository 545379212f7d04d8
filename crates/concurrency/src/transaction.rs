//! Transaction context for OCC
//!
//! This module implements the core transaction data structure of the
//! in-memory store. TransactionContext tracks every predicate read, buffered
//! update, insert and delete of one transaction, enabling validation at
//! commit time.
//!
//! # Snapshot acquisition
//!
//! The snapshot is taken lazily by the first statement, not by `begin`. This
//! is what makes "set the isolation level before the first statement" a real
//! constraint: once a statement ran, the snapshot policy is fixed.
//!
//! - `ReadCommitted`: a fresh snapshot for every statement
//! - `RepeatableRead` / `Serializable`: one snapshot for the whole transaction

use crate::validation::{validate_transaction, ValidationResult};
use ssiprobe_core::{
    Error, IsolationLevel, Predicate, Result, Row, RowId, Statement, StatementResult,
};
use ssiprobe_storage::{ApplyResult, Table, TableSnapshot, WriteBatch};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Error type for commit failures
#[derive(Debug, Clone)]
pub enum CommitError {
    /// Transaction aborted due to validation conflicts
    ValidationFailed {
        /// Aborted transaction
        txn_id: u64,
        /// Conflicts found
        result: ValidationResult,
    },

    /// A statement failed earlier; the transaction can only roll back
    PreviouslyFailed {
        /// Transaction id
        txn_id: u64,
        /// Failure that poisoned the transaction
        reason: String,
    },

    /// Transaction was not in a state that allows commit
    InvalidState {
        /// Transaction id
        txn_id: u64,
        /// Current state
        state: String,
    },
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::ValidationFailed { txn_id, result } => write!(
                f,
                "Commit of txn {} failed: {} conflict(s)",
                txn_id,
                result.conflict_count()
            ),
            CommitError::PreviouslyFailed { txn_id, reason } => {
                write!(f, "Txn {} failed earlier: {}", txn_id, reason)
            }
            CommitError::InvalidState { txn_id, state } => {
                write!(f, "Txn {} in invalid state: {}", txn_id, state)
            }
        }
    }
}

impl std::error::Error for CommitError {}

impl From<CommitError> for Error {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed { txn_id, result } => Error::SerializationFailure {
                txn_id,
                conflicts: result.conflict_count(),
            },
            CommitError::PreviouslyFailed { txn_id, reason } => {
                Error::TransactionAborted { txn_id, reason }
            }
            CommitError::InvalidState { txn_id, state } => {
                Error::TransactionNotActive { txn_id, state }
            }
        }
    }
}

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Validating` (begin commit)
/// - `Validating` → `Committed` (validation passed)
/// - `Validating` → `Aborted` (conflict detected)
/// - `Active` → `Failed` (a statement errored)
/// - `Active` / `Failed` → `Aborted` (rollback)
///
/// Terminal states: `Committed`, `Aborted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Transaction is executing statements
    Active,
    /// A statement failed; only rollback is meaningful
    Failed {
        /// What went wrong
        reason: String,
    },
    /// Transaction is being validated for conflicts
    Validating,
    /// Transaction committed successfully
    Committed,
    /// Transaction was aborted
    Aborted {
        /// Human-readable reason for abort
        reason: String,
    },
}

impl TransactionStatus {
    /// Short state name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            TransactionStatus::Active => "Active",
            TransactionStatus::Failed { .. } => "Failed",
            TransactionStatus::Validating => "Validating",
            TransactionStatus::Committed => "Committed",
            TransactionStatus::Aborted { .. } => "Aborted",
        }
    }
}

/// Record of one predicate evaluation against the snapshot
///
/// `observed` maps every snapshot row satisfying the predicate to the version
/// read. Re-evaluating the predicate on the committed table at commit time
/// must reproduce exactly this map, otherwise a concurrent transaction
/// changed what this one saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateRead {
    /// Filter that was evaluated
    pub predicate: Predicate,
    /// Matching rows and their versions
    pub observed: BTreeMap<RowId, u64>,
}

/// A buffered change to an existing row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpdate {
    /// New value of `name`
    pub name: String,
    /// Version of the row when this transaction first wrote it
    pub base_version: u64,
}

/// Summary of pending operations that would be discarded on abort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperations {
    /// Buffered updates of existing rows
    pub updates: usize,
    /// Buffered inserts
    pub inserts: usize,
    /// Buffered deletes
    pub deletes: usize,
}

impl PendingOperations {
    /// Total number of pending operations
    pub fn total(&self) -> usize {
        self.updates + self.inserts + self.deletes
    }

    /// Check if there are no pending operations
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Transaction context for OCC with snapshot reads
///
/// # Read-Your-Writes Semantics
///
/// Statements see the snapshot with this transaction's own buffered updates,
/// inserts and deletes layered on top.
///
/// # Read Tracking
///
/// Every statement that filters rows records a [`PredicateRead`] against the
/// snapshot, own writes excluded.
///
/// # Lifecycle
///
/// 1. **BEGIN**: `new()`, status `Active`, no snapshot yet
/// 2. **CONFIGURE**: optional `set_isolation_level()` before any statement
/// 3. **EXECUTE**: `execute()`
/// 4. **COMMIT/ABORT**: `commit()` + `apply_writes()`, or `mark_aborted()`
pub struct TransactionContext {
    /// Unique transaction ID
    pub txn_id: u64,
    /// Isolation level governing snapshots and validation
    pub isolation: IsolationLevel,
    /// Current snapshot, taken by the first statement
    snapshot: Option<TableSnapshot>,
    /// Predicate reads for validation
    pub predicate_reads: Vec<PredicateRead>,
    /// Buffered updates of rows that existed in the snapshot
    pub updates: BTreeMap<RowId, PendingUpdate>,
    /// Buffered inserts (ids already taken from the sequence)
    pub inserts: BTreeMap<RowId, String>,
    /// Buffered deletes with the version of the row when deleted
    pub deletes: BTreeMap<RowId, u64>,
    /// Statements executed so far
    statements_executed: usize,
    /// Current transaction status
    pub status: TransactionStatus,
    /// When this transaction was created
    start_time: Instant,
}

impl TransactionContext {
    /// Create a new transaction context at the default isolation level
    ///
    /// # Example
    ///
    /// ```
    /// use ssiprobe_concurrency::TransactionContext;
    ///
    /// let txn = TransactionContext::new(1);
    /// assert!(txn.is_active());
    /// assert!(txn.is_read_only());
    /// ```
    pub fn new(txn_id: u64) -> Self {
        TransactionContext {
            txn_id,
            isolation: IsolationLevel::default(),
            snapshot: None,
            predicate_reads: Vec::new(),
            updates: BTreeMap::new(),
            inserts: BTreeMap::new(),
            deletes: BTreeMap::new(),
            statements_executed: 0,
            status: TransactionStatus::Active,
            start_time: Instant::now(),
        }
    }

    // === State ===

    /// Check if transaction is active
    pub fn is_active(&self) -> bool {
        matches!(self.status, TransactionStatus::Active)
    }

    /// Check if transaction is committed
    pub fn is_committed(&self) -> bool {
        matches!(self.status, TransactionStatus::Committed)
    }

    /// Check if transaction is aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self.status, TransactionStatus::Aborted { .. })
    }

    /// Check if the transaction can still be rolled back
    pub fn can_rollback(&self) -> bool {
        matches!(
            self.status,
            TransactionStatus::Active
                | TransactionStatus::Failed { .. }
                | TransactionStatus::Validating
        )
    }

    /// Whether the transaction buffered no write
    pub fn is_read_only(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }

    /// Time since the transaction was created
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of statements executed so far
    pub fn statements_executed(&self) -> usize {
        self.statements_executed
    }

    /// Version of the current snapshot, if one was taken
    pub fn snapshot_version(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.version())
    }

    /// Summary of buffered operations
    pub fn pending_operations(&self) -> PendingOperations {
        PendingOperations {
            updates: self.updates.len(),
            inserts: self.inserts.len(),
            deletes: self.deletes.len(),
        }
    }

    /// Return an error unless the transaction is `Active`
    pub fn ensure_active(&self) -> Result<()> {
        match &self.status {
            TransactionStatus::Active => Ok(()),
            TransactionStatus::Failed { reason } => Err(Error::TransactionAborted {
                txn_id: self.txn_id,
                reason: format!(
                    "current transaction is aborted, commands ignored until end of transaction block ({})",
                    reason
                ),
            }),
            other => Err(Error::TransactionNotActive {
                txn_id: self.txn_id,
                state: other.name().to_string(),
            }),
        }
    }

    /// Move an active transaction to `Failed`
    pub fn mark_failed(&mut self, reason: String) {
        if self.is_active() {
            self.status = TransactionStatus::Failed { reason };
        }
    }

    // === Configuration ===

    /// Change the isolation level
    ///
    /// # Errors
    /// - `Error::IsolationLevelLocked` once a statement has run
    /// - `Error::TransactionNotActive` / `TransactionAborted` if not active
    pub fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<()> {
        self.ensure_active()?;
        if self.statements_executed > 0 {
            return Err(Error::IsolationLevelLocked);
        }
        self.isolation = level;
        Ok(())
    }

    // === Statement execution ===

    /// Execute one statement against the table
    ///
    /// The statement runs over the snapshot with this transaction's own
    /// writes applied. Writes are buffered until commit.
    pub fn execute(&mut self, table: &Table, statement: &Statement) -> Result<StatementResult> {
        self.ensure_active()?;
        self.refresh_snapshot(table);
        self.statements_executed += 1;

        if let Some(predicate) = statement.predicate() {
            self.record_predicate_read(predicate);
        }

        let result = match statement {
            Statement::SelectByName { name } => {
                let filter = Predicate::NameEquals(name.clone());
                StatementResult::Rows(self.visible_rows(&filter))
            }
            Statement::CountRange { low, high } => {
                let filter = Predicate::NameBetween {
                    low: low.clone(),
                    high: high.clone(),
                };
                StatementResult::Count(self.visible_rows(&filter).len() as u64)
            }
            Statement::SelectAll => StatementResult::Rows(self.visible_rows(&Predicate::All)),
            Statement::Insert { name } => {
                let id = table.next_row_id();
                self.inserts.insert(id, name.clone());
                StatementResult::Affected(1)
            }
            Statement::UpdateName { name, assign } => {
                let targets = self.visible_rows(&Predicate::NameEquals(name.clone()));
                let new_name = assign.evaluate();
                for row in &targets {
                    self.buffer_update(row.id, new_name.clone());
                }
                StatementResult::Affected(targets.len() as u64)
            }
            Statement::DeleteAll => {
                let targets = self.visible_rows(&Predicate::All);
                for row in &targets {
                    self.buffer_delete(row.id);
                }
                StatementResult::Affected(targets.len() as u64)
            }
        };

        Ok(result)
    }

    fn refresh_snapshot(&mut self, table: &Table) {
        if self.snapshot.is_none() || self.isolation == IsolationLevel::ReadCommitted {
            self.snapshot = Some(table.create_snapshot());
        }
    }

    fn record_predicate_read(&mut self, predicate: Predicate) {
        let observed = match &self.snapshot {
            Some(snapshot) => snapshot
                .scan(&predicate)
                .map(|vr| (vr.row.id, vr.version))
                .collect(),
            None => BTreeMap::new(),
        };
        self.predicate_reads.push(PredicateRead {
            predicate,
            observed,
        });
    }

    /// Rows visible to this transaction that satisfy `filter`, in id order
    fn visible_rows(&self, filter: &Predicate) -> Vec<Row> {
        let mut rows: BTreeMap<RowId, String> = BTreeMap::new();

        if let Some(snapshot) = &self.snapshot {
            for vr in snapshot.scan(&Predicate::All) {
                if self.deletes.contains_key(&vr.row.id) {
                    continue;
                }
                let name = match self.updates.get(&vr.row.id) {
                    Some(update) => update.name.clone(),
                    None => vr.row.name.clone(),
                };
                rows.insert(vr.row.id, name);
            }
        }
        for (id, name) in &self.inserts {
            rows.insert(*id, name.clone());
        }

        rows.into_iter()
            .filter(|(_, name)| filter.matches(name))
            .map(|(id, name)| Row::new(id, name))
            .collect()
    }

    fn base_version(&self, id: RowId) -> u64 {
        self.snapshot
            .as_ref()
            .and_then(|s| s.get(id))
            .map(|vr| vr.version)
            .unwrap_or(0)
    }

    fn buffer_update(&mut self, id: RowId, name: String) {
        if let Some(inserted) = self.inserts.get_mut(&id) {
            *inserted = name;
            return;
        }
        let base_version = self.base_version(id);
        self.updates
            .entry(id)
            .and_modify(|u| u.name = name.clone())
            .or_insert(PendingUpdate { name, base_version });
    }

    fn buffer_delete(&mut self, id: RowId) {
        if self.inserts.remove(&id).is_some() {
            return;
        }
        let base_version = match self.updates.remove(&id) {
            Some(update) => update.base_version,
            None => self.base_version(id),
        };
        self.deletes.insert(id, base_version);
    }

    // === Commit / Abort ===

    /// Validate and move to `Committed` or `Aborted`
    ///
    /// Performs state transitions only; [`apply_writes`](Self::apply_writes)
    /// makes the writes visible.
    ///
    /// # Returns
    /// - `Ok(())` if validation passed
    /// - `Err(CommitError::ValidationFailed)` on conflicts (now `Aborted`)
    /// - `Err(CommitError::PreviouslyFailed)` if a statement failed (now `Aborted`)
    /// - `Err(CommitError::InvalidState)` if not `Active`
    pub fn commit(&mut self, table: &Table) -> std::result::Result<(), CommitError> {
        match &self.status {
            TransactionStatus::Active => {}
            TransactionStatus::Failed { reason } => {
                let reason = reason.clone();
                self.status = TransactionStatus::Aborted {
                    reason: format!("rolled back after failure: {}", reason),
                };
                self.clear_operations();
                return Err(CommitError::PreviouslyFailed {
                    txn_id: self.txn_id,
                    reason,
                });
            }
            other => {
                return Err(CommitError::InvalidState {
                    txn_id: self.txn_id,
                    state: other.name().to_string(),
                });
            }
        }
        self.status = TransactionStatus::Validating;

        let validation_result = validate_transaction(self, table);

        if !validation_result.is_valid() {
            let conflict_count = validation_result.conflict_count();
            self.status = TransactionStatus::Aborted {
                reason: format!("Commit failed: {} conflict(s) detected", conflict_count),
            };
            self.clear_operations();
            return Err(CommitError::ValidationFailed {
                txn_id: self.txn_id,
                result: validation_result,
            });
        }

        self.status = TransactionStatus::Committed;
        Ok(())
    }

    /// Buffered writes as a batch for the table
    pub fn write_batch(&self) -> WriteBatch {
        WriteBatch {
            updates: self
                .updates
                .iter()
                .map(|(id, u)| (*id, u.name.clone()))
                .collect(),
            inserts: self
                .inserts
                .iter()
                .map(|(id, name)| Row::new(*id, name.clone()))
                .collect(),
            deletes: self.deletes.keys().copied().collect(),
        }
    }

    /// Apply all buffered writes to the table at `commit_version`
    ///
    /// # Errors
    /// `Error::TransactionNotActive` unless the transaction is `Committed`.
    pub fn apply_writes(&self, table: &Table, commit_version: u64) -> Result<ApplyResult> {
        if !self.is_committed() {
            return Err(Error::TransactionNotActive {
                txn_id: self.txn_id,
                state: self.status.name().to_string(),
            });
        }
        Ok(table.apply_batch(&self.write_batch(), commit_version))
    }

    /// Abort the transaction, discarding buffered writes
    ///
    /// # Errors
    /// `Error::TransactionNotActive` if already `Committed` or `Aborted`.
    pub fn mark_aborted(&mut self, reason: String) -> Result<()> {
        if !self.can_rollback() {
            return Err(Error::TransactionNotActive {
                txn_id: self.txn_id,
                state: self.status.name().to_string(),
            });
        }
        self.status = TransactionStatus::Aborted { reason };
        self.clear_operations();
        Ok(())
    }

    fn clear_operations(&mut self) {
        // predicate_reads are kept for diagnostics
        self.updates.clear();
        self.inserts.clear();
        self.deletes.clear();
    }
}

impl fmt::Debug for TransactionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionContext")
            .field("txn_id", &self.txn_id)
            .field("isolation", &self.isolation)
            .field("status", &self.status)
            .field("snapshot_version", &self.snapshot_version())
            .field("predicate_reads", &self.predicate_reads.len())
            .field("pending", &self.pending_operations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_table(names: &[&str]) -> Table {
        let table = Table::new();
        let inserts = names
            .iter()
            .map(|n| Row::new(table.next_row_id(), *n))
            .collect();
        table.apply_batch(
            &WriteBatch {
                inserts,
                ..WriteBatch::default()
            },
            1,
        );
        table
    }

    fn names(result: &StatementResult) -> Vec<String> {
        result
            .rows()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    #[test]
    fn test_new_transaction_has_no_snapshot() {
        let txn = TransactionContext::new(1);
        assert!(txn.snapshot_version().is_none());
        assert_eq!(txn.isolation, IsolationLevel::ReadCommitted);
        assert_eq!(txn.statements_executed(), 0);
    }

    #[test]
    fn test_select_by_name() {
        let table = seeded_table(&["Alice", "Bob"]);
        let mut txn = TransactionContext::new(1);
        let result = txn
            .execute(&table, &Statement::select_by_name("Alice"))
            .unwrap();
        assert_eq!(names(&result), vec!["Alice"]);
        assert_eq!(txn.predicate_reads.len(), 1);
        assert_eq!(txn.predicate_reads[0].observed.len(), 1);
    }

    #[test]
    fn test_isolation_locked_after_first_statement() {
        let table = seeded_table(&["Alice"]);
        let mut txn = TransactionContext::new(1);
        txn.set_isolation_level(IsolationLevel::Serializable).unwrap();
        txn.execute(&table, &Statement::SelectAll).unwrap();
        let err = txn
            .set_isolation_level(IsolationLevel::RepeatableRead)
            .unwrap_err();
        assert!(matches!(err, Error::IsolationLevelLocked));
        assert_eq!(txn.isolation, IsolationLevel::Serializable);
    }

    #[test]
    fn test_read_your_writes_insert_and_count() {
        let table = seeded_table(&["Alice", "Bob"]);
        let mut txn = TransactionContext::new(1);
        txn.set_isolation_level(IsolationLevel::Serializable).unwrap();
        let before = txn
            .execute(&table, &Statement::count_range("A", "M"))
            .unwrap();
        assert_eq!(before.count(), Some(2));

        txn.execute(&table, &Statement::insert("Charlie")).unwrap();
        let after = txn
            .execute(&table, &Statement::count_range("A", "M"))
            .unwrap();
        assert_eq!(after.count(), Some(3));
        // The table itself is untouched until commit
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_update_is_visible_to_own_reads_only() {
        let table = seeded_table(&["Alice", "Bob"]);
        let mut txn = TransactionContext::new(1);
        let affected = txn
            .execute(
                &table,
                &Statement::update_concat("Alice", "Alice_saw_", "Bob"),
            )
            .unwrap();
        assert_eq!(affected.affected(), Some(1));

        let mine = txn
            .execute(&table, &Statement::select_by_name("Alice_saw_Bob"))
            .unwrap();
        assert_eq!(names(&mine), vec!["Alice_saw_Bob"]);
        let gone = txn
            .execute(&table, &Statement::select_by_name("Alice"))
            .unwrap();
        assert!(names(&gone).is_empty());
    }

    #[test]
    fn test_update_of_own_insert_rewrites_insert() {
        let table = seeded_table(&[]);
        let mut txn = TransactionContext::new(1);
        txn.execute(&table, &Statement::insert("Charlie")).unwrap();
        txn.execute(&table, &Statement::update_literal("Charlie", "Chuck"))
            .unwrap();
        assert!(txn.updates.is_empty());
        assert_eq!(
            txn.inserts.values().cloned().collect::<Vec<_>>(),
            vec!["Chuck"]
        );
    }

    #[test]
    fn test_delete_all_drops_own_inserts_and_buffers_deletes() {
        let table = seeded_table(&["Alice", "Bob"]);
        let mut txn = TransactionContext::new(1);
        txn.execute(&table, &Statement::insert("Charlie")).unwrap();
        let affected = txn.execute(&table, &Statement::DeleteAll).unwrap();
        assert_eq!(affected.affected(), Some(3));
        assert!(txn.inserts.is_empty());
        assert_eq!(txn.deletes.len(), 2);
        let rows = txn.execute(&table, &Statement::SelectAll).unwrap();
        assert!(names(&rows).is_empty());
    }

    #[test]
    fn test_repeatable_read_keeps_snapshot() {
        let table = seeded_table(&["Alice"]);
        let mut txn = TransactionContext::new(1);
        txn.set_isolation_level(IsolationLevel::RepeatableRead)
            .unwrap();
        txn.execute(&table, &Statement::SelectAll).unwrap();

        let id = table.next_row_id();
        table.apply_batch(
            &WriteBatch {
                inserts: vec![Row::new(id, "Zed")],
                ..WriteBatch::default()
            },
            2,
        );

        let rows = txn.execute(&table, &Statement::SelectAll).unwrap();
        assert_eq!(names(&rows), vec!["Alice"]);
        assert_eq!(txn.snapshot_version(), Some(1));
    }

    #[test]
    fn test_read_committed_refreshes_snapshot() {
        let table = seeded_table(&["Alice"]);
        let mut txn = TransactionContext::new(1);
        txn.execute(&table, &Statement::SelectAll).unwrap();

        let id = table.next_row_id();
        table.apply_batch(
            &WriteBatch {
                inserts: vec![Row::new(id, "Zed")],
                ..WriteBatch::default()
            },
            2,
        );

        let rows = txn.execute(&table, &Statement::SelectAll).unwrap();
        assert_eq!(names(&rows), vec!["Alice", "Zed"]);
    }

    #[test]
    fn test_failed_transaction_rejects_statements_and_commit() {
        let table = seeded_table(&["Alice"]);
        let mut txn = TransactionContext::new(9);
        txn.execute(&table, &Statement::insert("Eve")).unwrap();
        txn.mark_failed("boom".to_string());

        let err = txn.execute(&table, &Statement::SelectAll).unwrap_err();
        assert!(matches!(err, Error::TransactionAborted { txn_id: 9, .. }));

        let commit_err = txn.commit(&table).unwrap_err();
        assert!(matches!(commit_err, CommitError::PreviouslyFailed { .. }));
        assert!(txn.is_aborted());
        assert!(txn.is_read_only());
    }

    #[test]
    fn test_commit_twice_is_invalid_state() {
        let table = seeded_table(&["Alice"]);
        let mut txn = TransactionContext::new(1);
        txn.commit(&table).unwrap();
        let err = txn.commit(&table).unwrap_err();
        assert!(matches!(err, CommitError::InvalidState { .. }));
        let converted: Error = err.into();
        assert!(matches!(converted, Error::TransactionNotActive { .. }));
    }

    #[test]
    fn test_mark_aborted_clears_writes() {
        let table = seeded_table(&["Alice"]);
        let mut txn = TransactionContext::new(1);
        txn.execute(&table, &Statement::insert("Eve")).unwrap();
        assert_eq!(txn.pending_operations().inserts, 1);
        txn.mark_aborted("user".to_string()).unwrap();
        assert!(txn.pending_operations().is_empty());
        assert!(txn.mark_aborted("again".to_string()).is_err());
    }

    #[test]
    fn test_apply_writes_requires_committed() {
        let table = seeded_table(&["Alice"]);
        let mut txn = TransactionContext::new(1);
        txn.execute(&table, &Statement::insert("Eve")).unwrap();
        assert!(txn.apply_writes(&table, 2).is_err());
        txn.commit(&table).unwrap();
        let applied = txn.apply_writes(&table, 2).unwrap();
        assert_eq!(applied.inserts_applied, 1);
        assert_eq!(table.len(), 2);
    }
}
