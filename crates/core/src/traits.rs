//! Store collaborator contract
//!
//! The harness never reaches into a store's internals. It opens transactions
//! through [`TransactionalStore`] and drives them through [`StoreTransaction`].
//! Any transactional backend that implements these two traits can be probed.
//!
//! `commit` and `rollback` consume the transaction, so a handle ends in
//! exactly one of the two terminal states.

use crate::error::Result;
use crate::statement::{Statement, StatementResult};
use crate::types::IsolationLevel;

/// A transactional data store
///
/// # Thread Safety
///
/// Stores are shared by reference between the orchestrating thread and both
/// role threads, so they must be `Send + Sync`.
pub trait TransactionalStore: Send + Sync {
    /// Transaction handle type produced by [`begin`](Self::begin)
    type Transaction: StoreTransaction;

    /// Open a new transaction at the store's default isolation level
    fn begin(&self) -> Result<Self::Transaction>;
}

/// One open transaction of a [`TransactionalStore`]
///
/// Handles are moved into role threads, so they must be `Send`.
pub trait StoreTransaction: Send {
    /// Store-assigned transaction id (used in log fields)
    fn id(&self) -> u64;

    /// Current isolation level
    fn isolation_level(&self) -> IsolationLevel;

    /// Change the isolation level
    ///
    /// Must be called before the first statement.
    fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<()>;

    /// Execute one statement inside the transaction
    fn execute(&mut self, statement: &Statement) -> Result<StatementResult>;

    /// Commit the transaction
    ///
    /// Serialization failures are reported here as ordinary errors.
    fn commit(self) -> Result<()>
    where
        Self: Sized;

    /// Roll the transaction back, discarding buffered writes
    fn rollback(self) -> Result<()>
    where
        Self: Sized;
}
