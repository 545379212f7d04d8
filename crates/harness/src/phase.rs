//! Phases of a role's transaction

use serde::{Deserialize, Serialize};
use std::fmt;

/// One stage of a role, in execution order
///
/// `Open` and `Isolation` precede the scripted phases; `Commit` is the last.
/// A failed role reports the phase it was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Opening the transaction
    Open,
    /// Applying the isolation level
    Isolation,
    /// Executing the script's reads
    Read,
    /// Arriving at the ready barrier
    ReadySignal,
    /// Waiting for the ready barrier to release
    ProceedWait,
    /// Executing the writes and re-check reads
    Write,
    /// Arriving at the write-done barrier
    WriteDoneSignal,
    /// Waiting for the write-done barrier to release
    CommitWait,
    /// Committing
    Commit,
}

impl Phase {
    /// Every phase, in execution order
    pub const ALL: [Phase; 9] = [
        Phase::Open,
        Phase::Isolation,
        Phase::Read,
        Phase::ReadySignal,
        Phase::ProceedWait,
        Phase::Write,
        Phase::WriteDoneSignal,
        Phase::CommitWait,
        Phase::Commit,
    ];

    /// Name used in log fields and reports
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Open => "open",
            Phase::Isolation => "isolation",
            Phase::Read => "read",
            Phase::ReadySignal => "ready-signal",
            Phase::ProceedWait => "proceed-wait",
            Phase::Write => "write",
            Phase::WriteDoneSignal => "write-done-signal",
            Phase::CommitWait => "commit-wait",
            Phase::Commit => "commit",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
