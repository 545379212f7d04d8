//! Role executor: one generic skeleton for every scenario
//!
//! ```text
//! read ─▶ ready-signal ─▶ proceed-wait ─▶ write ─▶ write-done-signal ─▶ commit-wait ─▶ commit
//! ```
//!
//! The executor owns the role's barrier tickets and completion guard. Any
//! early exit drops them, which abandons the barriers the role never reached
//! and signals completion, so the other role and the orchestrator always
//! make progress.

use crate::barrier::{BarrierTicket, Release};
use crate::completion::{CompletionGuard, RoleOutcome};
use crate::error::RoleError;
use crate::phase::Phase;
use crate::runner::TransactionRunner;
use crate::scenario::{ReadView, Scenario};
use ssiprobe_core::{IsolationLevel, Role, RunId, Statement, StatementResult, StoreTransaction};
use tracing::{debug, info, warn};

/// Everything a role needs for one run
pub(crate) struct RoleContext<'a> {
    pub(crate) run_id: RunId,
    pub(crate) scenario: &'a Scenario,
    pub(crate) role: Role,
    pub(crate) isolation: IsolationLevel,
    pub(crate) ready: BarrierTicket<'a>,
    pub(crate) write_done: BarrierTicket<'a>,
    pub(crate) guard: CompletionGuard<'a>,
}

/// Run the role to completion inside `txn` and signal its outcome
pub(crate) fn run_role<T: StoreTransaction>(ctx: RoleContext<'_>, txn: T) {
    let RoleContext {
        run_id,
        scenario,
        role,
        isolation,
        ready,
        write_done,
        mut guard,
    } = ctx;

    guard.enter(Phase::Isolation);
    let runner = TransactionRunner::new(scenario.name(), role, isolation);
    let mut steps = Steps {
        run_id,
        scenario,
        role,
        runner: &runner,
        guard: &mut guard,
    };
    let result = runner.run(txn, |txn| steps.execute(txn, ready, write_done));

    let outcome = match result {
        Ok(()) => {
            info!(
                target: "ssiprobe::role",
                %run_id,
                scenario = scenario.name(),
                %role,
                "transaction committed"
            );
            RoleOutcome::Committed
        }
        Err(e) => {
            info!(
                target: "ssiprobe::role",
                %run_id,
                scenario = scenario.name(),
                %role,
                phase = %e.phase,
                serialization_failure = e.is_serialization_failure(),
                error = %e.source,
                "transaction rolled back"
            );
            outcome_of(&e)
        }
    };

    if let Err(e) = guard.complete(outcome) {
        warn!(target: "ssiprobe::role", %run_id, %role, error = %e, "completion rejected");
    }
}

fn outcome_of(e: &RoleError) -> RoleOutcome {
    RoleOutcome::RolledBack {
        phase: e.phase,
        error: e.source.to_string(),
    }
}

struct Steps<'r, 'a> {
    run_id: RunId,
    scenario: &'a Scenario,
    role: Role,
    runner: &'r TransactionRunner<'a>,
    guard: &'r mut CompletionGuard<'a>,
}

impl Steps<'_, '_> {
    fn execute<T: StoreTransaction>(
        &mut self,
        txn: &mut T,
        ready: BarrierTicket<'_>,
        write_done: BarrierTicket<'_>,
    ) -> Result<(), RoleError> {
        let script = self.scenario.script(self.role);

        self.guard.enter(Phase::Read);
        let mut view = ReadView::new();
        for statement in &script.reads {
            let result = self.statement(txn, Phase::Read, statement)?;
            view.push(statement.clone(), result);
        }

        self.guard.enter(Phase::ReadySignal);
        ready
            .arrive()
            .map_err(|e| self.runner.error(Phase::ReadySignal, e))?;
        self.guard.enter(Phase::ProceedWait);
        let proceed = ready.await_release();
        self.note_release(ready.barrier_name(), proceed);

        self.guard.enter(Phase::Write);
        let writes = script
            .build_writes(&view)
            .map_err(|e| self.runner.error(Phase::Write, e))?;
        for statement in &writes {
            self.statement(txn, Phase::Write, statement)?;
        }
        for statement in &script.recheck {
            let result = self.statement(txn, Phase::Write, statement)?;
            if let Some(count) = result.count() {
                info!(
                    target: "ssiprobe::role",
                    run_id = %self.run_id,
                    scenario = self.scenario.name(),
                    role = %self.role,
                    count,
                    "re-check count"
                );
            }
        }

        self.guard.enter(Phase::WriteDoneSignal);
        write_done
            .arrive()
            .map_err(|e| self.runner.error(Phase::WriteDoneSignal, e))?;
        self.guard.enter(Phase::CommitWait);
        let commit = write_done.await_release();
        self.note_release(write_done.barrier_name(), commit);

        self.guard.enter(Phase::Commit);
        Ok(())
    }

    fn statement<T: StoreTransaction>(
        &self,
        txn: &mut T,
        phase: Phase,
        statement: &Statement,
    ) -> Result<StatementResult, RoleError> {
        let result = txn
            .execute(statement)
            .map_err(|e| self.runner.error(phase, e))?;
        debug!(
            target: "ssiprobe::role",
            run_id = %self.run_id,
            scenario = self.scenario.name(),
            role = %self.role,
            %phase,
            %statement,
            ?result,
            "executed"
        );
        Ok(result)
    }

    fn note_release(&self, barrier: &'static str, release: Release) {
        if let Release::Abandoned { party } = release {
            // The survivor carries on alone.
            info!(
                target: "ssiprobe::role",
                run_id = %self.run_id,
                scenario = self.scenario.name(),
                role = %self.role,
                barrier,
                abandoned_by = %party,
                "other role abandoned barrier, continuing"
            );
        }
    }
}
