//! Declarative scenario descriptions
//!
//! A [`Scenario`] is data, not control flow: each role is a [`RoleScript`]
//! listing the reads to run before the ready barrier, a builder turning the
//! read results into write statements, and optional re-check reads run after
//! the writes. The role executor in [`crate::role`] runs every script with
//! the same barrier skeleton.

use crate::verify::FinalCheck;
use ssiprobe_core::{Role, Row, Statement, StatementResult};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while turning read results into writes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The builder asked for a read the script does not have
    #[error("read #{index} does not exist")]
    MissingRead {
        /// Requested position
        index: usize,
    },

    /// A read returned something other than what the builder expects
    #[error("read #{index} (`{statement}`) expected {expected}, got {found}")]
    UnexpectedResult {
        /// Position of the read
        index: usize,
        /// Rendered statement
        statement: String,
        /// What the builder expected
        expected: &'static str,
        /// What came back
        found: String,
    },
}

/// Results of a role's read phase, in script order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadView {
    reads: Vec<(Statement, StatementResult)>,
}

impl ReadView {
    /// Create an empty view
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the result of one read
    pub fn push(&mut self, statement: Statement, result: StatementResult) {
        self.reads.push((statement, result));
    }

    /// Number of reads
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Whether no read ran
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Statement and result of read `index`
    pub fn get(&self, index: usize) -> Result<&(Statement, StatementResult), ScriptError> {
        self.reads
            .get(index)
            .ok_or(ScriptError::MissingRead { index })
    }

    /// Rows returned by read `index`
    pub fn rows(&self, index: usize) -> Result<&[Row], ScriptError> {
        let (statement, result) = self.get(index)?;
        result
            .rows()
            .ok_or_else(|| unexpected(index, statement, "rows", result))
    }

    /// The `name` of the single row returned by read `index`
    pub fn single_name(&self, index: usize) -> Result<&str, ScriptError> {
        let rows = self.rows(index)?;
        match rows {
            [row] => Ok(row.name.as_str()),
            _ => {
                let (statement, result) = self.get(index)?;
                Err(unexpected(index, statement, "exactly one row", result))
            }
        }
    }

    /// Count returned by read `index`
    pub fn count(&self, index: usize) -> Result<u64, ScriptError> {
        let (statement, result) = self.get(index)?;
        result
            .count()
            .ok_or_else(|| unexpected(index, statement, "a count", result))
    }
}

fn unexpected(
    index: usize,
    statement: &Statement,
    expected: &'static str,
    found: &StatementResult,
) -> ScriptError {
    let found = match found {
        StatementResult::Rows(rows) => format!("{} row(s)", rows.len()),
        StatementResult::Count(n) => format!("count {}", n),
        StatementResult::Affected(n) => format!("{} affected", n),
    };
    ScriptError::UnexpectedResult {
        index,
        statement: statement.to_string(),
        expected,
        found,
    }
}

/// Builds the write statements of a role from its read results
pub type WriteBuilder =
    Arc<dyn Fn(&ReadView) -> Result<Vec<Statement>, ScriptError> + Send + Sync>;

/// What one role does inside its transaction
#[derive(Clone)]
pub struct RoleScript {
    /// Statements run before the ready barrier
    pub reads: Vec<Statement>,
    /// Turns the read results into the write statements
    pub write: WriteBuilder,
    /// Statements run after the writes, before the write-done barrier
    pub recheck: Vec<Statement>,
}

impl RoleScript {
    /// Script with the given reads and write builder, no re-check
    pub fn new<F>(reads: Vec<Statement>, write: F) -> Self
    where
        F: Fn(&ReadView) -> Result<Vec<Statement>, ScriptError> + Send + Sync + 'static,
    {
        RoleScript {
            reads,
            write: Arc::new(write),
            recheck: Vec::new(),
        }
    }

    /// Script whose writes do not depend on the reads
    pub fn fixed(reads: Vec<Statement>, writes: Vec<Statement>) -> Self {
        Self::new(reads, move |_| Ok(writes.clone()))
    }

    /// Add re-check reads run after the writes
    pub fn with_recheck(mut self, recheck: Vec<Statement>) -> Self {
        self.recheck = recheck;
        self
    }

    /// Build the writes for a read view
    pub fn build_writes(&self, view: &ReadView) -> Result<Vec<Statement>, ScriptError> {
        (self.write)(view)
    }
}

impl fmt::Debug for RoleScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleScript")
            .field("reads", &self.reads)
            .field("recheck", &self.recheck)
            .finish_non_exhaustive()
    }
}

/// A named anomaly pattern: one script per role
#[derive(Clone)]
pub struct Scenario {
    name: String,
    description: String,
    scripts: [RoleScript; 2],
    final_check: Option<FinalCheck>,
    required_rows: Vec<String>,
}

impl Scenario {
    /// Create a scenario from the Loser's and the Winner's scripts
    pub fn new(name: impl Into<String>, loser: RoleScript, winner: RoleScript) -> Self {
        Scenario {
            name: name.into(),
            description: String::new(),
            scripts: [loser, winner],
            final_check: None,
            required_rows: Vec::new(),
        }
    }

    /// Attach a one-line description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a final-state check run by the driver
    pub fn with_final_check(mut self, check: FinalCheck) -> Self {
        self.final_check = Some(check);
        self
    }

    /// Names the seed must contain for the scripts to run
    pub fn with_required_rows<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.required_rows = names.into_iter().map(Into::into).collect();
        self
    }

    /// Scenario name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Script of `role`
    pub fn script(&self, role: Role) -> &RoleScript {
        &self.scripts[role.index()]
    }

    /// Final-state check, if any
    pub fn final_check(&self) -> Option<FinalCheck> {
        self.final_check
    }

    /// Names the seed must contain
    pub fn required_rows(&self) -> &[String] {
        &self.required_rows
    }

    /// Required names absent from `seed`
    pub fn missing_rows(&self, seed: &[String]) -> Vec<String> {
        self.required_rows
            .iter()
            .filter(|name| !seed.contains(name))
            .cloned()
            .collect()
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("loser", self.script(Role::Loser))
            .field("winner", self.script(Role::Winner))
            .field("final_check", &self.final_check.is_some())
            .field("required_rows", &self.required_rows)
            .finish()
    }
}
