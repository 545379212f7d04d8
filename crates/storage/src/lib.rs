//! Storage layer for ssiprobe
//!
//! This crate implements the committed state of the in-memory store:
//! - Table: BTreeMap-based `test(id, name)` relation behind an RwLock
//! - Version management with AtomicU64 (one version per commit)
//! - A non-transactional row id sequence
//! - TableSnapshot: clone-based point-in-time view
//!
//! Transactions, buffering and validation live in `ssiprobe-concurrency`;
//! this crate only knows how to read committed rows and apply a batch.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;
pub mod table;

pub use snapshot::TableSnapshot;
pub use table::{ApplyResult, Table, VersionedRow, WriteBatch};
