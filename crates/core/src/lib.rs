//! Core types and traits for ssiprobe
//!
//! This crate defines the vocabulary shared by the store and the harness:
//! - RunId: Unique identifier for one scenario run
//! - Role: The two participants of a scenario (Loser, Winner)
//! - IsolationLevel: Transaction isolation levels understood by stores
//! - Row / RowId: The single `test(id, name)` relation
//! - Statement / StatementResult: The closed statement set scenarios issue
//! - Error: Error type hierarchy
//! - Traits: Store collaborator contract (TransactionalStore, StoreTransaction)
//! - ProbeConfig: `ssiprobe.toml` configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod statement;
pub mod traits;
pub mod types;

pub use config::{ProbeConfig, CONFIG_FILE_NAME};
pub use error::{Error, Result};
pub use statement::{Assignment, Predicate, Statement, StatementResult};
pub use traits::{StoreTransaction, TransactionalStore};
pub use types::{IsolationLevel, Role, Row, RowId, RunId};
