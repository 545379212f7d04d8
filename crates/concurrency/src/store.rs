//! MemoryStore: the in-memory store collaborator
//!
//! Wires [`Table`], [`TransactionManager`] and [`TransactionContext`] behind
//! the [`TransactionalStore`] / [`StoreTransaction`] traits the harness
//! drives. Faults can be injected to make `begin`, isolation changes or
//! specific statements fail.

use crate::manager::{CommitStats, TransactionManager};
use crate::transaction::TransactionContext;
use parking_lot::Mutex;
use ssiprobe_core::{
    Error, IsolationLevel, Predicate, Result, Row, Statement, StatementResult, StoreTransaction,
    TransactionalStore,
};
use ssiprobe_storage::Table;
use std::sync::Arc;
use tracing::{debug, warn};

/// A failure to inject into a [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail the `nth` (0-based) call to `begin` after injection, once
    Begin {
        /// Which call fails
        nth: u64,
    },
    /// Fail the `nth` (0-based) isolation change after injection, once
    SetIsolation {
        /// Which call fails
        nth: u64,
    },
    /// Fail every execution of this exact statement
    Statement(Statement),
}

#[derive(Debug, Default)]
struct FaultState {
    /// (nth, calls seen)
    begin: Option<(u64, u64)>,
    set_isolation: Option<(u64, u64)>,
    statements: Vec<Statement>,
}

impl FaultState {
    fn trip(slot: &mut Option<(u64, u64)>) -> bool {
        match slot {
            Some((nth, seen)) if *seen == *nth => {
                *slot = None;
                true
            }
            Some((_, seen)) => {
                *seen += 1;
                false
            }
            None => false,
        }
    }
}

struct StoreInner {
    table: Table,
    manager: TransactionManager,
    faults: Mutex<FaultState>,
}

/// In-memory transactional store over one `test(id, name)` table
///
/// Cloning is cheap and clones share the same table.
///
/// # Example
///
/// ```
/// use ssiprobe_concurrency::MemoryStore;
/// use ssiprobe_core::{Statement, StoreTransaction, TransactionalStore};
///
/// let store = MemoryStore::new();
/// let mut txn = store.begin().unwrap();
/// txn.execute(&Statement::insert("Alice")).unwrap();
/// txn.commit().unwrap();
/// assert_eq!(store.committed_rows().len(), 1);
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        let table = Table::new();
        let manager = TransactionManager::new(table.current_version());
        MemoryStore {
            inner: Arc::new(StoreInner {
                table,
                manager,
                faults: Mutex::new(FaultState::default()),
            }),
        }
    }

    /// Arm a fault
    pub fn inject(&self, fault: Fault) {
        debug!(target: "ssiprobe::store", ?fault, "fault injected");
        let mut faults = self.inner.faults.lock();
        match fault {
            Fault::Begin { nth } => faults.begin = Some((nth, 0)),
            Fault::SetIsolation { nth } => faults.set_isolation = Some((nth, 0)),
            Fault::Statement(statement) => faults.statements.push(statement),
        }
    }

    /// Disarm every fault
    pub fn clear_faults(&self) {
        *self.inner.faults.lock() = FaultState::default();
    }

    /// Commit counters
    pub fn stats(&self) -> CommitStats {
        self.inner.manager.stats()
    }

    /// Latest committed rows in id order, read outside any transaction
    ///
    /// Diagnostic only; the harness reads through transactions.
    pub fn committed_rows(&self) -> Vec<Row> {
        self.inner
            .table
            .scan(&Predicate::All)
            .into_iter()
            .map(|vr| vr.row)
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("rows", &self.inner.table.len())
            .field("version", &self.inner.table.current_version())
            .field("stats", &self.stats())
            .finish()
    }
}

impl TransactionalStore for MemoryStore {
    type Transaction = MemoryTransaction;

    fn begin(&self) -> Result<MemoryTransaction> {
        if FaultState::trip(&mut self.inner.faults.lock().begin) {
            warn!(target: "ssiprobe::store", "begin failed (injected)");
            return Err(Error::BeginFailed("injected fault".to_string()));
        }
        Ok(MemoryTransaction {
            ctx: self.inner.manager.begin(),
            inner: Arc::clone(&self.inner),
        })
    }
}

/// One open transaction of a [`MemoryStore`]
///
/// Dropping an unfinished transaction rolls it back.
pub struct MemoryTransaction {
    ctx: TransactionContext,
    inner: Arc<StoreInner>,
}

impl MemoryTransaction {
    /// Underlying context, for inspection
    pub fn context(&self) -> &TransactionContext {
        &self.ctx
    }
}

impl StoreTransaction for MemoryTransaction {
    fn id(&self) -> u64 {
        self.ctx.txn_id
    }

    fn isolation_level(&self) -> IsolationLevel {
        self.ctx.isolation
    }

    fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<()> {
        if FaultState::trip(&mut self.inner.faults.lock().set_isolation) {
            warn!(target: "ssiprobe::store", txn_id = self.ctx.txn_id, %level, "set isolation failed (injected)");
            return Err(Error::IsolationFailed {
                level,
                reason: "injected fault".to_string(),
            });
        }
        self.ctx.set_isolation_level(level)
    }

    fn execute(&mut self, statement: &Statement) -> Result<StatementResult> {
        let injected = self.inner.faults.lock().statements.contains(statement);
        if injected {
            self.ctx.ensure_active()?;
            let reason = format!("injected fault on `{}`", statement);
            warn!(target: "ssiprobe::store", txn_id = self.ctx.txn_id, %statement, "statement failed (injected)");
            self.ctx.mark_failed(reason.clone());
            return Err(Error::StatementFailed(reason));
        }
        self.ctx.execute(&self.inner.table, statement)
    }

    fn commit(mut self) -> Result<()> {
        self.inner
            .manager
            .commit(&mut self.ctx, &self.inner.table)
            .map(|_| ())
            .map_err(Error::from)
    }

    fn rollback(mut self) -> Result<()> {
        self.inner
            .manager
            .abort(&mut self.ctx, "rollback requested".to_string())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.ctx.can_rollback() {
            let _ = self
                .inner
                .manager
                .abort(&mut self.ctx, "dropped without commit".to_string());
        }
    }
}
