//! TransactionRunner: begin, configure, run a body, commit or roll back
//!
//! The runner owns the transaction lifecycle of one role so that every
//! path ends in exactly one of commit or rollback:
//!
//! ```text
//! begin ──▶ set isolation ──▶ body ──▶ commit
//!   │            │             │         │
//!   ▼            ▼             ▼         ▼
//!  Err     rollback+Err   rollback+Err   Err (no retry)
//! ```
//!
//! Every failed transition is logged with scenario and role fields. Logging
//! never changes the control flow.

use crate::error::{RoleError, RoleFailure};
use crate::phase::Phase;
use ssiprobe_core::{IsolationLevel, Role, StoreTransaction, TransactionalStore};
use tracing::{debug, warn};

/// Runs one role's body inside a transaction
#[derive(Debug, Clone)]
pub struct TransactionRunner<'a> {
    scenario: &'a str,
    role: Role,
    isolation: IsolationLevel,
}

impl<'a> TransactionRunner<'a> {
    /// Runner for `role` of `scenario` at `isolation`
    pub fn new(scenario: &'a str, role: Role, isolation: IsolationLevel) -> Self {
        TransactionRunner {
            scenario,
            role,
            isolation,
        }
    }

    /// Isolation level the runner applies
    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Wrap a failure with this runner's scenario and role
    pub fn error(&self, phase: Phase, source: impl Into<RoleFailure>) -> RoleError {
        RoleError::new(self.scenario, self.role, phase, source)
    }

    /// Open a transaction on `store`, then [`run`](Self::run) it
    pub fn begin_and_run<S, F>(&self, store: &S, body: F) -> Result<(), RoleError>
    where
        S: TransactionalStore,
        F: FnOnce(&mut S::Transaction) -> Result<(), RoleError>,
    {
        let txn = store.begin().map_err(|e| {
            warn!(
                target: "ssiprobe::role",
                scenario = self.scenario,
                role = %self.role,
                error = %e,
                "failed to begin transaction"
            );
            self.error(Phase::Open, e)
        })?;
        self.run(txn, body)
    }

    /// Run `body` inside an already open transaction
    ///
    /// A non-default isolation level is applied before the body. If that or
    /// the body fails, the transaction is rolled back and the error returned.
    /// Otherwise the transaction is committed; a commit failure is returned
    /// with [`Phase::Commit`].
    pub fn run<T, F>(&self, mut txn: T, body: F) -> Result<(), RoleError>
    where
        T: StoreTransaction,
        F: FnOnce(&mut T) -> Result<(), RoleError>,
    {
        let txn_id = txn.id();

        if !self.isolation.is_default() {
            if let Err(e) = txn.set_isolation_level(self.isolation) {
                warn!(
                    target: "ssiprobe::role",
                    scenario = self.scenario,
                    role = %self.role,
                    txn_id,
                    isolation = %self.isolation,
                    error = %e,
                    "failed to set isolation level"
                );
                self.rollback(txn);
                return Err(self.error(Phase::Isolation, e));
            }
        }

        if let Err(e) = body(&mut txn) {
            warn!(
                target: "ssiprobe::role",
                scenario = self.scenario,
                role = %self.role,
                txn_id,
                phase = %e.phase,
                error = %e.source,
                "transaction body failed"
            );
            self.rollback(txn);
            return Err(e);
        }

        match txn.commit() {
            Ok(()) => {
                debug!(
                    target: "ssiprobe::role",
                    scenario = self.scenario,
                    role = %self.role,
                    txn_id,
                    "committed"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    target: "ssiprobe::role",
                    scenario = self.scenario,
                    role = %self.role,
                    txn_id,
                    error = %e,
                    "failed to commit"
                );
                Err(self.error(Phase::Commit, e))
            }
        }
    }

    fn rollback<T: StoreTransaction>(&self, txn: T) {
        if let Err(e) = txn.rollback() {
            warn!(
                target: "ssiprobe::role",
                scenario = self.scenario,
                role = %self.role,
                error = %e,
                "failed to roll back"
            );
        }
    }
}
