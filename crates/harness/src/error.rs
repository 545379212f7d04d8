//! Error types for the harness
//!
//! Every failure inside a role is wrapped in a [`RoleError`] carrying the
//! scenario, role and phase it happened in. [`HarnessError`] is reserved for
//! failures of the orchestration itself.

use crate::barrier::BarrierError;
use crate::completion::CompletionError;
use crate::phase::Phase;
use crate::scenario::ScriptError;
use ssiprobe_core::Role;
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// What went wrong inside a role
#[derive(Debug, Error)]
pub enum RoleFailure {
    /// The store reported an error
    #[error(transparent)]
    Store(#[from] ssiprobe_core::Error),

    /// A barrier rejected the role
    #[error(transparent)]
    Barrier(#[from] BarrierError),

    /// The scenario script could not build its writes
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// A role failure with its scenario, role and phase
#[derive(Debug, Error)]
#[error("[{scenario}] {role} failed during {phase}: {source}")]
pub struct RoleError {
    /// Scenario name
    pub scenario: String,
    /// Failing role
    pub role: Role,
    /// Phase the role was in
    pub phase: Phase,
    /// Underlying failure
    #[source]
    pub source: RoleFailure,
}

impl RoleError {
    /// Wrap a failure with its context
    pub fn new(
        scenario: impl Into<String>,
        role: Role,
        phase: Phase,
        source: impl Into<RoleFailure>,
    ) -> Self {
        RoleError {
            scenario: scenario.into(),
            role,
            phase,
            source: source.into(),
        }
    }

    /// Whether the store rejected the commit for serializability
    pub fn is_serialization_failure(&self) -> bool {
        matches!(&self.source, RoleFailure::Store(e) if e.is_serialization_failure())
    }
}

/// Errors of the orchestration layer and its callers
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No scenario with this name in the catalog
    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),

    /// The seed lacks rows a scenario's scripts read
    #[error("scenario '{scenario}' needs seed rows {missing:?}")]
    SeedMismatch {
        /// Scenario name
        scenario: String,
        /// Required names absent from the seed
        missing: Vec<String>,
    },

    /// The exactly-two-signals contract was broken
    #[error("completion contract violated: {0}")]
    Completion(#[from] CompletionError),

    /// A barrier could not be released
    #[error("barrier failure: {0}")]
    Barrier(#[from] BarrierError),

    /// A store operation outside the roles failed (seeding, verification)
    #[error("store error: {0}")]
    Store(#[from] ssiprobe_core::Error),
}
