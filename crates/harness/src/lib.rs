//! Barrier-driven anomaly harness for ssiprobe
//!
//! This crate forces two transactions, the Loser and the Winner, through
//! aligned phases so that an isolation anomaly's dependency cycle exists at
//! a known moment instead of by timing luck:
//!
//! - PhaseBarrier: one-shot two-party rendezvous with abandonment
//! - CompletionTracker: exactly one completion signal per role
//! - TransactionRunner: begin / isolation / body / commit-or-rollback
//! - Scenario / RoleScript: declarative description of each role
//! - Orchestrator: runs a scenario and returns a ScenarioReport
//! - catalog: dirty read, phantom read and write skew
//!
//! The harness only talks to stores through the `ssiprobe-core` traits.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod barrier;
pub mod catalog;
pub mod completion;
pub mod error;
pub mod orchestrator;
pub mod phase;
mod role;
pub mod runner;
pub mod scenario;
pub mod verify;

pub use barrier::{BarrierError, BarrierTicket, PhaseBarrier, Release};
pub use completion::{CompletionError, CompletionGuard, CompletionTracker, RoleOutcome};
pub use error::{HarnessError, Result, RoleError, RoleFailure};
pub use orchestrator::{
    BarrierRelease, Orchestrator, OrchestratorState, ScenarioReport, READY_BARRIER,
    WRITE_DONE_BARRIER,
};
pub use phase::Phase;
pub use runner::TransactionRunner;
pub use scenario::{ReadView, RoleScript, Scenario, ScriptError, WriteBuilder};
pub use verify::{classify, FinalCheck, FinalState, OutcomeClass};
