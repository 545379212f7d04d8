//! Completion signals: exactly one per role per run
//!
//! The orchestrator owns a [`CompletionTracker`] with one slot per role. Each
//! role holds a [`CompletionGuard`] and reports through it. A guard that is
//! dropped without reporting (early return, panic, thread never spawned)
//! reports a rollback at the phase it last entered, so a run can never end
//! up with fewer than two signals. A second signal for the same role is
//! rejected and counted.

use crate::phase::Phase;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use ssiprobe_core::Role;
use std::fmt;
use thiserror::Error;
use tracing::error;

/// How a role's transaction ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum RoleOutcome {
    /// The transaction committed
    Committed,
    /// The transaction was rolled back
    RolledBack {
        /// Phase that failed
        phase: Phase,
        /// Rendered error
        error: String,
    },
}

impl RoleOutcome {
    /// Whether the transaction committed
    pub fn is_committed(&self) -> bool {
        matches!(self, RoleOutcome::Committed)
    }

    /// Failing phase of a rolled-back role
    pub fn failed_phase(&self) -> Option<Phase> {
        match self {
            RoleOutcome::Committed => None,
            RoleOutcome::RolledBack { phase, .. } => Some(*phase),
        }
    }
}

impl fmt::Display for RoleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleOutcome::Committed => f.write_str("committed"),
            RoleOutcome::RolledBack { phase, error } => {
                write!(f, "rolled back at {}: {}", phase, error)
            }
        }
    }
}

/// Completion contract violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// A role signalled more than once
    #[error("{role} signalled completion more than once")]
    Duplicate {
        /// Offending role
        role: Role,
    },
}

#[derive(Debug, Default)]
struct Slots {
    outcomes: [Option<RoleOutcome>; 2],
    duplicates: usize,
}

/// Sink of capacity two for role completion signals
#[derive(Debug, Default)]
pub struct CompletionTracker {
    slots: Mutex<Slots>,
    done: Condvar,
}

impl CompletionTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard through which `role` reports its outcome
    pub fn guard(&self, role: Role) -> CompletionGuard<'_> {
        CompletionGuard {
            tracker: self,
            role,
            phase: Phase::Open,
            signalled: false,
        }
    }

    /// Deliver the outcome of `role`
    ///
    /// # Errors
    /// `Duplicate` if the role already signalled; the first outcome is kept.
    pub fn signal(&self, role: Role, outcome: RoleOutcome) -> Result<(), CompletionError> {
        let mut slots = self.slots.lock();
        let slot = &mut slots.outcomes[role.index()];
        if slot.is_some() {
            slots.duplicates += 1;
            error!(target: "ssiprobe::orchestrator", %role, "duplicate completion signal");
            return Err(CompletionError::Duplicate { role });
        }
        *slot = Some(outcome);
        self.done.notify_all();
        Ok(())
    }

    /// Number of accepted signals
    pub fn signals(&self) -> usize {
        self.slots
            .lock()
            .outcomes
            .iter()
            .filter(|o| o.is_some())
            .count()
    }

    /// Number of rejected duplicate signals
    pub fn duplicates(&self) -> usize {
        self.slots.lock().duplicates
    }

    /// Block until both roles signalled; outcomes indexed by [`Role::index`]
    pub fn wait_all(&self) -> [RoleOutcome; 2] {
        let mut slots = self.slots.lock();
        loop {
            if let [Some(loser), Some(winner)] = &slots.outcomes {
                return [loser.clone(), winner.clone()];
            }
            self.done.wait(&mut slots);
        }
    }
}

/// A role's obligation to signal completion exactly once
///
/// Track progress with [`enter`](Self::enter); finish with
/// [`complete`](Self::complete). Dropping an uncompleted guard signals a
/// rollback at the current phase.
#[derive(Debug)]
pub struct CompletionGuard<'a> {
    tracker: &'a CompletionTracker,
    role: Role,
    phase: Phase,
    signalled: bool,
}

impl<'a> CompletionGuard<'a> {
    /// Role the guard belongs to
    pub fn role(&self) -> Role {
        self.role
    }

    /// Phase the role is currently in
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Record that the role entered `phase`
    pub fn enter(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Deliver the role's outcome
    pub fn complete(mut self, outcome: RoleOutcome) -> Result<(), CompletionError> {
        self.signalled = true;
        self.tracker.signal(self.role, outcome)
    }
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        if self.signalled {
            return;
        }
        let outcome = RoleOutcome::RolledBack {
            phase: self.phase,
            error: if std::thread::panicking() {
                "role panicked".to_string()
            } else {
                "role exited without reporting an outcome".to_string()
            },
        };
        let _ = self.tracker.signal(self.role, outcome);
    }
}
