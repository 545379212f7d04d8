//! Error types for ssiprobe stores and configuration
//!
//! This module defines the errors a store collaborator reports to the harness.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The harness treats every variant as an ordinary failure of the role that
//! hit it; `SerializationFailure` is not special-cased anywhere in the
//! orchestration layer.

use std::io;
use thiserror::Error;

use crate::types::IsolationLevel;

/// Result type alias for store and configuration operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ssiprobe stores and configuration
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (config files)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// The store refused to open a new transaction
    #[error("Failed to begin transaction: {0}")]
    BeginFailed(String),

    /// The isolation level could not be applied
    #[error("Failed to set transaction isolation level {level}: {reason}")]
    IsolationFailed {
        /// Level that was requested
        level: IsolationLevel,
        /// Why the store refused
        reason: String,
    },

    /// The isolation level was changed after the first statement
    #[error("SET TRANSACTION ISOLATION LEVEL must be called before any query")]
    IsolationLevelLocked,

    /// A statement failed to execute
    #[error("Statement failed: {0}")]
    StatementFailed(String),

    /// Commit-time validation found a dependency the level does not allow
    #[error(
        "could not serialize access due to read/write dependencies among transactions \
         (txn {txn_id}, {conflicts} conflict(s))"
    )]
    SerializationFailure {
        /// Transaction that was aborted
        txn_id: u64,
        /// Number of conflicts found during validation
        conflicts: usize,
    },

    /// The transaction already failed and only accepts rollback
    #[error("Transaction {txn_id} aborted: {reason}")]
    TransactionAborted {
        /// Transaction that was aborted
        txn_id: u64,
        /// Human-readable reason
        reason: String,
    },

    /// Operation issued against a transaction that is no longer active
    #[error("Transaction {txn_id} is not active (state: {state})")]
    TransactionNotActive {
        /// Transaction id
        txn_id: u64,
        /// Current state name
        state: String,
    },

    /// Configuration could not be parsed or holds an invalid value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether this is a commit-time serialization failure
    pub fn is_serialization_failure(&self) -> bool {
        matches!(self, Error::SerializationFailure { .. })
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
