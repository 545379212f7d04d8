//! Orchestrator: runs one scenario with a forced two-phase interleave
//!
//! ```text
//! Init ──open both txns──▶ RolesLaunched ──ready released──▶ BothReady
//!      ──write-done released──▶ BothWriteDone ──2 signals──▶ Done
//! ```
//!
//! The orchestrator owns both barriers and the completion tracker for the
//! duration of the run. Roles run on scoped threads and borrow them.
//!
//! # Failure semantics
//!
//! - If either transaction cannot be opened, no role is launched and the
//!   orchestrator emits both completion signals itself
//! - A role that fails abandons the barriers it has not reached; the
//!   orchestrator still releases them and the other role carries on
//! - With a barrier timeout, a role that does not arrive in time is
//!   abandoned; without one, the wait is unbounded
//!
//! `run` returns only after exactly two completion signals exist.

use crate::barrier::{BarrierError, PhaseBarrier, Release};
use crate::completion::{CompletionTracker, RoleOutcome};
use crate::error::{HarnessError, Result};
use crate::phase::Phase;
use crate::role::{run_role, RoleContext};
use crate::scenario::Scenario;
use crate::verify::{classify, OutcomeClass};
use chrono::{DateTime, Utc};
use serde::Serialize;
use ssiprobe_core::{IsolationLevel, Role, RunId, StoreTransaction, TransactionalStore};
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Name of the barrier between the read and write phases
pub const READY_BARRIER: &str = "ready";
/// Name of the barrier between the write phase and commit
pub const WRITE_DONE_BARRIER: &str = "write-done";

/// Orchestrator state for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrchestratorState {
    /// Nothing started
    Init,
    /// Both roles are running
    RolesLaunched,
    /// The ready barrier was released
    BothReady,
    /// The write-done barrier was released
    BothWriteDone,
    /// Both completion signals were received
    Done,
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrchestratorState::Init => "init",
            OrchestratorState::RolesLaunched => "roles-launched",
            OrchestratorState::BothReady => "both-ready",
            OrchestratorState::BothWriteDone => "both-write-done",
            OrchestratorState::Done => "done",
        };
        f.write_str(s)
    }
}

/// How a barrier was released during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarrierRelease {
    /// Barrier name
    pub barrier: &'static str,
    /// Broadcast release
    pub release: Release,
    /// Whether the orchestrator had to force-abandon a late party
    pub timed_out: bool,
}

/// Result of one orchestrated run
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Unique id of the run
    pub run_id: RunId,
    /// Scenario name
    pub scenario: String,
    /// Isolation level of both roles
    pub isolation: IsolationLevel,
    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,
    /// Run duration in milliseconds
    pub elapsed_ms: u64,
    /// Loser's outcome
    pub loser: RoleOutcome,
    /// Winner's outcome
    pub winner: RoleOutcome,
    /// Barrier releases, in order
    pub releases: Vec<BarrierRelease>,
    /// Completion signals received
    pub signals: usize,
    /// Last state reached
    pub state: OrchestratorState,
}

impl ScenarioReport {
    /// Outcome of `role`
    pub fn outcome(&self, role: Role) -> &RoleOutcome {
        match role {
            Role::Loser => &self.loser,
            Role::Winner => &self.winner,
        }
    }

    /// Structural outcome class
    pub fn class(&self) -> OutcomeClass {
        classify(&self.loser, &self.winner)
    }
}

/// Runs scenarios against a store
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    isolation: IsolationLevel,
    barrier_timeout: Option<Duration>,
}

impl Orchestrator {
    /// Orchestrator running both roles at `isolation`, without barrier timeout
    pub fn new(isolation: IsolationLevel) -> Self {
        Orchestrator {
            isolation,
            barrier_timeout: None,
        }
    }

    /// Bound the wait for arrivals at each barrier
    pub fn with_barrier_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.barrier_timeout = timeout;
        self
    }

    /// Isolation level of both roles
    pub fn isolation(&self) -> IsolationLevel {
        self.isolation
    }

    /// Barrier timeout, if any
    pub fn barrier_timeout(&self) -> Option<Duration> {
        self.barrier_timeout
    }

    /// Run `scenario` once against `store`
    ///
    /// # Errors
    /// Only contract violations of the orchestration itself; role failures
    /// are reported in the returned [`ScenarioReport`].
    pub fn run<S: TransactionalStore>(
        &self,
        store: &S,
        scenario: &Scenario,
    ) -> Result<ScenarioReport> {
        let run_id = RunId::new();
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = OrchestratorState::Init;

        let ready = PhaseBarrier::new(READY_BARRIER);
        let write_done = PhaseBarrier::new(WRITE_DONE_BARRIER);
        let completion = CompletionTracker::new();
        let mut releases = Vec::with_capacity(2);

        debug!(
            target: "ssiprobe::orchestrator",
            %run_id,
            scenario = scenario.name(),
            isolation = %self.isolation,
            "run started"
        );

        let txns = match open_pair(store) {
            Ok(txns) => txns,
            Err((role, e)) => {
                error!(
                    target: "ssiprobe::orchestrator",
                    %run_id,
                    scenario = scenario.name(),
                    %role,
                    error = %e,
                    "failed to open transaction, roles not launched"
                );
                let failed = RoleOutcome::RolledBack {
                    phase: Phase::Open,
                    error: e.to_string(),
                };
                let skipped = RoleOutcome::RolledBack {
                    phase: Phase::Open,
                    error: format!("not launched: {} failed to open its transaction", role),
                };
                for r in Role::ALL {
                    let outcome = if r == role {
                        failed.clone()
                    } else {
                        skipped.clone()
                    };
                    completion.signal(r, outcome)?;
                }
                advance(run_id, &mut state, OrchestratorState::Done);
                return Ok(self.report(
                    run_id, scenario, started_at, start, &completion, releases, state,
                ));
            }
        };

        thread::scope(|s| -> Result<()> {
            let mut handles = Vec::with_capacity(2);
            for (role, txn) in Role::ALL.into_iter().zip(txns) {
                let ctx = RoleContext {
                    run_id,
                    scenario,
                    role,
                    isolation: self.isolation,
                    ready: ready.ticket(role),
                    write_done: write_done.ticket(role),
                    guard: completion.guard(role),
                };
                let spawned = thread::Builder::new()
                    .name(format!("ssiprobe-{}", role.as_str().to_lowercase()))
                    .spawn_scoped(s, move || run_role(ctx, txn));
                match spawned {
                    Ok(handle) => handles.push((role, handle)),
                    // The dropped context abandoned the barriers and signalled.
                    Err(e) => error!(
                        target: "ssiprobe::orchestrator",
                        %run_id,
                        %role,
                        error = %e,
                        "failed to spawn role thread"
                    ),
                }
            }
            advance(run_id, &mut state, OrchestratorState::RolesLaunched);

            let stages = [
                (&ready, OrchestratorState::BothReady),
                (&write_done, OrchestratorState::BothWriteDone),
            ];
            for (barrier, next) in stages {
                match self.release(run_id, scenario, barrier) {
                    Ok(release) => releases.push(release),
                    Err(e) => {
                        // The scope joins the roles, so none may stay blocked.
                        unblock(run_id, [&ready, &write_done]);
                        return Err(e);
                    }
                }
                advance(run_id, &mut state, next);
            }

            completion.wait_all();
            advance(run_id, &mut state, OrchestratorState::Done);

            for (role, handle) in handles {
                if handle.join().is_err() {
                    error!(target: "ssiprobe::orchestrator", %run_id, %role, "role thread panicked");
                }
            }
            Ok(())
        })?;

        let duplicates = completion.duplicates();
        if duplicates > 0 {
            warn!(target: "ssiprobe::orchestrator", %run_id, duplicates, "extra completion signals");
        }

        let report = self.report(
            run_id, scenario, started_at, start, &completion, releases, state,
        );
        info!(
            target: "ssiprobe::orchestrator",
            %run_id,
            scenario = scenario.name(),
            loser = %report.loser,
            winner = %report.winner,
            class = %report.class(),
            elapsed_ms = report.elapsed_ms,
            "run finished"
        );
        Ok(report)
    }

    fn release(
        &self,
        run_id: RunId,
        scenario: &Scenario,
        barrier: &PhaseBarrier,
    ) -> Result<BarrierRelease> {
        let timed_out = match barrier.wait_for_arrivals(self.barrier_timeout) {
            Ok(()) => false,
            Err(BarrierError::Timeout { pending, waited, .. }) => {
                warn!(
                    target: "ssiprobe::orchestrator",
                    %run_id,
                    scenario = scenario.name(),
                    barrier = barrier.name(),
                    ?pending,
                    waited_ms = waited.as_millis() as u64,
                    "abandoning late roles"
                );
                true
            }
            Err(e) => return Err(HarnessError::Barrier(e)),
        };
        let release = barrier.release()?;
        debug!(
            target: "ssiprobe::orchestrator",
            %run_id,
            scenario = scenario.name(),
            barrier = barrier.name(),
            %release,
            "barrier released"
        );
        Ok(BarrierRelease {
            barrier: barrier.name(),
            release,
            timed_out,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn report(
        &self,
        run_id: RunId,
        scenario: &Scenario,
        started_at: DateTime<Utc>,
        start: Instant,
        completion: &CompletionTracker,
        releases: Vec<BarrierRelease>,
        state: OrchestratorState,
    ) -> ScenarioReport {
        let signals = completion.signals();
        let [loser, winner] = completion.wait_all();
        ScenarioReport {
            run_id,
            scenario: scenario.name().to_string(),
            isolation: self.isolation,
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            loser,
            winner,
            releases,
            signals,
            state,
        }
    }
}

fn advance(run_id: RunId, state: &mut OrchestratorState, next: OrchestratorState) {
    debug!(target: "ssiprobe::orchestrator", %run_id, from = %state, to = %next, "state");
    *state = next;
}

/// Force-release every barrier so no role waits forever
fn unblock(run_id: RunId, barriers: [&PhaseBarrier; 2]) {
    for barrier in barriers {
        let release = barrier.force_release();
        error!(
            target: "ssiprobe::orchestrator",
            %run_id,
            barrier = barrier.name(),
            %release,
            "barrier force-released after orchestration failure"
        );
    }
}

/// Open the Loser's then the Winner's transaction
///
/// On failure the already open transaction is rolled back and the role
/// that failed is returned with the error.
fn open_pair<S: TransactionalStore>(
    store: &S,
) -> std::result::Result<[S::Transaction; 2], (Role, ssiprobe_core::Error)> {
    let loser = store.begin().map_err(|e| (Role::Loser, e))?;
    match store.begin() {
        Ok(winner) => Ok([loser, winner]),
        Err(e) => {
            if let Err(rollback) = loser.rollback() {
                warn!(target: "ssiprobe::orchestrator", error = %rollback, "failed to roll back Loser");
            }
            Err((Role::Winner, e))
        }
    }
}
