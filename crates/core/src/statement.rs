//! Statements issued against the `test(id, name)` relation
//!
//! Scenarios do not carry SQL text. They carry a small closed set of typed
//! statements, each equivalent to one SQL statement of the form:
//!
//! ```text
//! SelectByName { name }        SELECT name FROM test WHERE name = $1
//! CountRange { low, high }     SELECT COUNT(*) FROM test WHERE name >= $1 AND name <= $2
//! SelectAll                    SELECT id, name FROM test ORDER BY id
//! Insert { name }              INSERT INTO test (name) VALUES ($1)
//! UpdateName { name, assign }  UPDATE test SET name = <assign> WHERE name = $1
//! DeleteAll                    DELETE FROM test
//! ```
//!
//! Every statement except `Insert` reads through a [`Predicate`], which is what
//! a store tracks for commit-time validation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Row;

/// Row filter over the `name` column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Predicate {
    /// Every row
    All,
    /// `name = value`
    NameEquals(String),
    /// `name >= low AND name <= high` (byte-wise string order)
    NameBetween {
        /// Inclusive lower bound
        low: String,
        /// Inclusive upper bound
        high: String,
    },
}

impl Predicate {
    /// Whether a row with this name satisfies the predicate
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Predicate::All => true,
            Predicate::NameEquals(value) => name == value,
            Predicate::NameBetween { low, high } => name >= low.as_str() && name <= high.as_str(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All => f.write_str("TRUE"),
            Predicate::NameEquals(v) => write!(f, "name = '{}'", v),
            Predicate::NameBetween { low, high } => {
                write!(f, "name >= '{}' AND name <= '{}'", low, high)
            }
        }
    }
}

/// Right-hand side of `SET name = ...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assignment {
    /// A literal computed by the client
    Literal(String),
    /// `prefix || value`, computed by the store
    Concat {
        /// Left operand
        prefix: String,
        /// Right operand (a bound parameter)
        value: String,
    },
}

impl Assignment {
    /// Evaluate the assignment to the new column value
    pub fn evaluate(&self) -> String {
        match self {
            Assignment::Literal(v) => v.clone(),
            Assignment::Concat { prefix, value } => format!("{}{}", prefix, value),
        }
    }
}

/// A statement against the `test` relation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statement {
    /// `SELECT name FROM test WHERE name = $1`
    SelectByName {
        /// Name to look up
        name: String,
    },
    /// `SELECT COUNT(*) FROM test WHERE name >= $1 AND name <= $2`
    CountRange {
        /// Inclusive lower bound
        low: String,
        /// Inclusive upper bound
        high: String,
    },
    /// `SELECT id, name FROM test ORDER BY id`
    SelectAll,
    /// `INSERT INTO test (name) VALUES ($1)`
    Insert {
        /// Name of the new row
        name: String,
    },
    /// `UPDATE test SET name = <assign> WHERE name = $1`
    UpdateName {
        /// Rows to update
        name: String,
        /// New value
        assign: Assignment,
    },
    /// `DELETE FROM test`
    DeleteAll,
}

impl Statement {
    /// `SELECT name FROM test WHERE name = $1`
    pub fn select_by_name(name: impl Into<String>) -> Self {
        Statement::SelectByName { name: name.into() }
    }

    /// `SELECT COUNT(*) FROM test WHERE name >= $1 AND name <= $2`
    pub fn count_range(low: impl Into<String>, high: impl Into<String>) -> Self {
        Statement::CountRange {
            low: low.into(),
            high: high.into(),
        }
    }

    /// `INSERT INTO test (name) VALUES ($1)`
    pub fn insert(name: impl Into<String>) -> Self {
        Statement::Insert { name: name.into() }
    }

    /// `UPDATE test SET name = $2 WHERE name = $1`
    pub fn update_literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Statement::UpdateName {
            name: name.into(),
            assign: Assignment::Literal(value.into()),
        }
    }

    /// `UPDATE test SET name = $2 || $3 WHERE name = $1`
    pub fn update_concat(
        name: impl Into<String>,
        prefix: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Statement::UpdateName {
            name: name.into(),
            assign: Assignment::Concat {
                prefix: prefix.into(),
                value: value.into(),
            },
        }
    }

    /// The predicate this statement reads through, if any
    pub fn predicate(&self) -> Option<Predicate> {
        match self {
            Statement::SelectByName { name } | Statement::UpdateName { name, .. } => {
                Some(Predicate::NameEquals(name.clone()))
            }
            Statement::CountRange { low, high } => Some(Predicate::NameBetween {
                low: low.clone(),
                high: high.clone(),
            }),
            Statement::SelectAll | Statement::DeleteAll => Some(Predicate::All),
            Statement::Insert { .. } => None,
        }
    }

    /// Whether the statement modifies data
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Statement::Insert { .. } | Statement::UpdateName { .. } | Statement::DeleteAll
        )
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::SelectByName { name } => {
                write!(f, "SELECT name FROM test WHERE name = '{}'", name)
            }
            Statement::CountRange { low, high } => write!(
                f,
                "SELECT COUNT(*) FROM test WHERE name >= '{}' AND name <= '{}'",
                low, high
            ),
            Statement::SelectAll => f.write_str("SELECT id, name FROM test ORDER BY id"),
            Statement::Insert { name } => write!(f, "INSERT INTO test (name) VALUES ('{}')", name),
            Statement::UpdateName { name, assign } => match assign {
                Assignment::Literal(v) => {
                    write!(f, "UPDATE test SET name = '{}' WHERE name = '{}'", v, name)
                }
                Assignment::Concat { prefix, value } => write!(
                    f,
                    "UPDATE test SET name = '{}' || '{}' WHERE name = '{}'",
                    prefix, value, name
                ),
            },
            Statement::DeleteAll => f.write_str("DELETE FROM test"),
        }
    }
}

/// Result of executing a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementResult {
    /// Rows returned by a select
    Rows(Vec<Row>),
    /// Value of a `COUNT(*)`
    Count(u64),
    /// Number of rows inserted, updated or deleted
    Affected(u64),
}

impl StatementResult {
    /// Returned rows, if this is a row result
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            StatementResult::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Count value, if this is a count result
    pub fn count(&self) -> Option<u64> {
        match self {
            StatementResult::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Affected row count, if this is a write result
    pub fn affected(&self) -> Option<u64> {
        match self {
            StatementResult::Affected(n) => Some(*n),
            _ => None,
        }
    }
}
