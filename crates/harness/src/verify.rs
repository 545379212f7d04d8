//! Outcome classification and final-state checks

use crate::completion::RoleOutcome;
use serde::{Deserialize, Serialize};
use ssiprobe_core::{Role, Row};
use std::fmt;

/// Structural outcome of a run
///
/// Which role wins is not deterministic; only the class is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "class")]
pub enum OutcomeClass {
    /// Exactly one role committed
    OneWinner {
        /// The role that committed
        committed: Role,
    },
    /// Both roles committed (the anomaly went through)
    BothCommitted,
    /// Neither role committed
    BothFailed,
}

impl OutcomeClass {
    /// Whether exactly one role committed
    pub fn is_one_winner(&self) -> bool {
        matches!(self, OutcomeClass::OneWinner { .. })
    }

    /// Whether `role` committed
    pub fn committed(&self, role: Role) -> bool {
        match self {
            OutcomeClass::OneWinner { committed } => *committed == role,
            OutcomeClass::BothCommitted => true,
            OutcomeClass::BothFailed => false,
        }
    }

    /// Number of committed roles
    pub fn committed_count(&self) -> usize {
        Role::ALL.into_iter().filter(|r| self.committed(*r)).count()
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeClass::OneWinner { committed } => write!(f, "one winner ({})", committed),
            OutcomeClass::BothCommitted => f.write_str("both committed"),
            OutcomeClass::BothFailed => f.write_str("both failed"),
        }
    }
}

/// Classify the outcomes of the Loser and the Winner
pub fn classify(loser: &RoleOutcome, winner: &RoleOutcome) -> OutcomeClass {
    match (loser.is_committed(), winner.is_committed()) {
        (true, true) => OutcomeClass::BothCommitted,
        (false, false) => OutcomeClass::BothFailed,
        (true, false) => OutcomeClass::OneWinner {
            committed: Role::Loser,
        },
        (false, true) => OutcomeClass::OneWinner {
            committed: Role::Winner,
        },
    }
}

/// Committed table contents after a run, in id order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalState {
    rows: Vec<Row>,
}

impl FinalState {
    /// Wrap rows read after the run
    pub fn new(rows: Vec<Row>) -> Self {
        FinalState { rows }
    }

    /// Rows in id order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Names in id order
    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name.as_str()).collect()
    }

    /// Whether a row with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.rows.iter().any(|r| r.name == name)
    }

    /// Rows whose name lies in `low..=high`
    pub fn count_in_range(&self, low: &str, high: &str) -> usize {
        self.rows
            .iter()
            .filter(|r| in_range(&r.name, low, high))
            .count()
    }
}

fn in_range(name: &str, low: &str, high: &str) -> bool {
    name >= low && name <= high
}

/// Check of the final table against the outcome class
///
/// The third argument is the seed the table held before the run. Returns a
/// description of the mismatch on failure.
pub type FinalCheck = fn(&FinalState, &OutcomeClass, &[String]) -> Result<(), String>;

/// Expect the rows each role's update leaves behind
///
/// `updates[i]` is `(original, updated)` for the role with index `i`: a
/// committed role turned `original` into `updated`, a failed one left it.
/// Rows named neither are not inspected.
pub fn expect_updates(
    state: &FinalState,
    class: &OutcomeClass,
    updates: [(&str, &str); 2],
) -> Result<(), String> {
    let mut expected: Vec<&str> = Role::ALL
        .into_iter()
        .map(|role| {
            let (original, updated) = updates[role.index()];
            if class.committed(role) {
                updated
            } else {
                original
            }
        })
        .collect();
    expected.sort_unstable();

    let mut actual: Vec<&str> = state
        .names()
        .into_iter()
        .filter(|name| {
            updates
                .iter()
                .any(|(original, updated)| name == original || name == updated)
        })
        .collect();
    actual.sort_unstable();

    if actual == expected {
        Ok(())
    } else {
        Err(format!(
            "{}: expected rows {:?}, found {:?}",
            class, expected, actual
        ))
    }
}

/// Expect the seeded rows in `low..=high` plus one per committed insert
pub fn expect_range_count(
    state: &FinalState,
    class: &OutcomeClass,
    (low, high): (&str, &str),
    seed: &[String],
) -> Result<(), String> {
    let base = seed.iter().filter(|n| in_range(n, low, high)).count();
    let expected = base + class.committed_count();
    let actual = state.count_in_range(low, high);
    if actual == expected {
        Ok(())
    } else {
        Err(format!(
            "{}: expected {} row(s) in {}..={}, found {}",
            class, expected, low, high, actual
        ))
    }
}
