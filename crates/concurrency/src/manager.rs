//! Transaction manager for coordinating commit operations
//!
//! Provides atomic commit by orchestrating:
//! 1. Validation (first-committer-wins)
//! 2. Table application (visibility)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. acquire commit lock
//! 2. txn.commit(table)     - Active → Validating → Committed | Aborted
//! 3. IF conflicts: return error (transaction already Aborted)
//! 4. allocate commit_version
//! 5. apply_writes()        - rows become visible at commit_version
//! 6. release commit lock, return Ok(commit_version)
//! ```
//!
//! The lock spans validation and apply. Without it two transactions could
//! both validate against the same table state and both commit, which is
//! exactly the anomaly the harness is trying to provoke.

use crate::{CommitError, TransactionContext};
use parking_lot::Mutex;
use ssiprobe_core::Result;
use ssiprobe_storage::Table;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Counters reported by [`TransactionManager::stats`]
///
/// Observational only; loaded with relaxed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Transactions that committed
    pub committed: u64,
    /// Transactions aborted by validation or after a failure
    pub aborted: u64,
    /// Transactions rolled back on request
    pub rolled_back: u64,
}

/// Manages transaction ids, commit versions and the commit protocol
///
/// Global version counter is incremented once per committing transaction
/// that writes; all rows of the transaction get the same version.
pub struct TransactionManager {
    /// Global version counter
    version: AtomicU64,
    /// Next transaction ID
    next_txn_id: AtomicU64,
    /// Serializes validate + apply
    commit_lock: Mutex<()>,
    committed: AtomicU64,
    aborted: AtomicU64,
    rolled_back: AtomicU64,
}

impl TransactionManager {
    /// Create a new transaction manager
    ///
    /// # Arguments
    /// * `initial_version` - Starting version (the table's current version)
    pub fn new(initial_version: u64) -> Self {
        TransactionManager {
            version: AtomicU64::new(initial_version),
            next_txn_id: AtomicU64::new(1),
            commit_lock: Mutex::new(()),
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
            rolled_back: AtomicU64::new(0),
        }
    }

    /// Get current global version
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Allocate next commit version (increment global version)
    pub fn allocate_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Begin a new transaction context
    pub fn begin(&self) -> TransactionContext {
        let txn = TransactionContext::new(self.next_txn_id());
        debug!(target: "ssiprobe::txn", txn_id = txn.txn_id, "begin");
        txn
    }

    /// Commit a transaction atomically
    ///
    /// # Returns
    /// - `Ok(commit_version)` on success; read-only transactions return the
    ///   current version without allocating a new one
    /// - `Err(CommitError)` if validation fails or the transaction is not
    ///   committable
    pub fn commit(
        &self,
        txn: &mut TransactionContext,
        table: &Table,
    ) -> std::result::Result<u64, CommitError> {
        let _guard = self.commit_lock.lock();

        if let Err(e) = txn.commit(table) {
            if txn.is_aborted() {
                self.aborted.fetch_add(1, Ordering::Relaxed);
            }
            debug!(
                target: "ssiprobe::txn",
                txn_id = txn.txn_id,
                isolation = %txn.isolation,
                error = %e,
                "commit rejected"
            );
            return Err(e);
        }

        let commit_version = if txn.is_read_only() {
            self.current_version()
        } else {
            let version = self.allocate_version();
            match txn.apply_writes(table, version) {
                Ok(applied) => {
                    debug!(
                        target: "ssiprobe::txn",
                        txn_id = txn.txn_id,
                        commit_version = version,
                        operations = applied.total_operations(),
                        skipped = applied.updates_skipped,
                        "writes applied"
                    );
                }
                Err(e) => {
                    // Unreachable after a successful txn.commit(); state is Committed.
                    return Err(CommitError::InvalidState {
                        txn_id: txn.txn_id,
                        state: e.to_string(),
                    });
                }
            }
            version
        };

        self.committed.fetch_add(1, Ordering::Relaxed);
        debug!(
            target: "ssiprobe::txn",
            txn_id = txn.txn_id,
            commit_version,
            elapsed_us = txn.elapsed().as_micros() as u64,
            "committed"
        );
        Ok(commit_version)
    }

    /// Explicitly abort a transaction
    pub fn abort(&self, txn: &mut TransactionContext, reason: String) -> Result<()> {
        txn.mark_aborted(reason)?;
        self.rolled_back.fetch_add(1, Ordering::Relaxed);
        debug!(target: "ssiprobe::txn", txn_id = txn.txn_id, "rolled back");
        Ok(())
    }

    /// Snapshot of the commit counters
    pub fn stats(&self) -> CommitStats {
        CommitStats {
            committed: self.committed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            rolled_back: self.rolled_back.load(Ordering::Relaxed),
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(0)
    }
}
