//! Core types for ssiprobe
//!
//! This module defines the foundational types:
//! - RunId: Unique identifier for one scenario run
//! - Role: Loser / Winner
//! - IsolationLevel: read committed, repeatable read, serializable
//! - RowId / Row: rows of the `test` relation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

/// Unique identifier for a scenario run
///
/// A RunId is a wrapper around a UUID v4. Every orchestrated run gets a fresh
/// one so log lines from repeated runs of the same scenario can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Create a new random RunId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a RunId from a string representation
    ///
    /// # Errors
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this RunId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the two participants of a scenario
///
/// The names reflect the expected outcome under serializable isolation, not a
/// guaranteed one: whichever transaction commits second is the one aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// The participant expected to be aborted
    Loser,
    /// The participant expected to commit
    Winner,
}

impl Role {
    /// Both roles, Loser first
    pub const ALL: [Role; 2] = [Role::Loser, Role::Winner];

    /// Slot index of this role in two-element arrays
    pub fn index(self) -> usize {
        match self {
            Role::Loser => 0,
            Role::Winner => 1,
        }
    }

    /// The other participant
    pub fn other(self) -> Role {
        match self {
            Role::Loser => Role::Winner,
            Role::Winner => Role::Loser,
        }
    }

    /// Human-readable name used in log fields
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Loser => "Loser",
            Role::Winner => "Winner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction isolation level
///
/// `ReadCommitted` is the store default, so a runner only issues an explicit
/// isolation change for the other two levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationLevel {
    /// Every statement sees the latest committed data; no commit validation
    #[default]
    ReadCommitted,
    /// Snapshot isolation: one snapshot per transaction, write-write conflicts only
    RepeatableRead,
    /// Snapshot isolation plus read-set validation; anomalies abort a participant
    Serializable,
}

impl IsolationLevel {
    /// Whether this is the store default (no explicit change needed)
    pub fn is_default(self) -> bool {
        self == IsolationLevel::default()
    }

    /// Canonical lowercase name, as accepted by [`FromStr`]
    pub fn as_str(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "read-committed",
            IsolationLevel::RepeatableRead => "repeatable-read",
            IsolationLevel::Serializable => "serializable",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IsolationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "read-committed" => Ok(IsolationLevel::ReadCommitted),
            "repeatable-read" | "snapshot" => Ok(IsolationLevel::RepeatableRead),
            "serializable" => Ok(IsolationLevel::Serializable),
            other => Err(Error::InvalidConfig(format!(
                "unknown isolation level '{}'. Expected \"read-committed\", \"repeatable-read\" or \"serializable\".",
                other
            ))),
        }
    }
}

/// Identifier of a row in the `test` relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

impl RowId {
    /// Raw numeric id
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row of the `test(id, name)` relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Row {
    /// Row identifier
    pub id: RowId,
    /// The `name` column
    pub name: String,
}

impl Row {
    /// Create a row
    pub fn new(id: RowId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
