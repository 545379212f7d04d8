//! Concurrency layer for ssiprobe
//!
//! This crate implements the transactional half of the in-memory store with
//! optimistic concurrency control (OCC):
//! - TransactionContext: predicate read tracking and buffered writes
//! - Snapshot reads (per statement or per transaction, by isolation level)
//! - Conflict detection at commit time (first-committer-wins)
//! - MemoryStore: the `TransactionalStore` implementation, with fault
//!   injection for driving failure paths

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod store;
pub mod transaction;
pub mod validation;

pub use manager::{CommitStats, TransactionManager};
pub use store::{Fault, MemoryStore, MemoryTransaction};
pub use transaction::{
    CommitError, PendingOperations, PendingUpdate, PredicateRead, TransactionContext,
    TransactionStatus,
};
pub use validation::{ConflictType, ValidationResult};
