//! Driver: seed, run, verify
//!
//! The driver owns a store and runs scenarios against it one at a time:
//!
//! 1. reseed the table in one transaction (`DELETE FROM test` + inserts)
//! 2. run the scenario through the [`Orchestrator`]
//! 3. read the final table in a read-only transaction
//! 4. classify the outcome and run the scenario's final-state check
//!
//! A run passes when its check passes and, under serializable isolation,
//! exactly one role committed.

use serde::Serialize;
use ssiprobe_core::{
    IsolationLevel, ProbeConfig, Statement, StoreTransaction, TransactionalStore,
};
use ssiprobe_harness::{
    catalog, FinalState, HarnessError, Orchestrator, OutcomeClass, Result, Scenario,
    ScenarioReport,
};
use tracing::{error, info, warn};

/// Verified result of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    /// Orchestrator report
    #[serde(flatten)]
    pub report: ScenarioReport,
    /// Structural outcome
    pub outcome: OutcomeClass,
    /// Committed rows after the run
    pub final_state: FinalState,
    /// Final-state check failure, if any
    pub check_error: Option<String>,
}

impl RunRecord {
    /// Whether the run met expectations
    pub fn passed(&self) -> bool {
        if self.check_error.is_some() {
            return false;
        }
        self.report.isolation != IsolationLevel::Serializable || self.outcome.is_one_winner()
    }
}

/// Every run of a driver invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct DriverReport {
    /// Runs in execution order
    pub runs: Vec<RunRecord>,
}

impl DriverReport {
    /// Whether every run passed
    pub fn passed(&self) -> bool {
        self.runs.iter().all(RunRecord::passed)
    }

    /// Runs that did not pass
    pub fn failures(&self) -> impl Iterator<Item = &RunRecord> {
        self.runs.iter().filter(|r| !r.passed())
    }
}

/// Seeds the store and runs scenarios against it
pub struct Driver<S> {
    store: S,
    orchestrator: Orchestrator,
    seed: Vec<String>,
    repeat: u32,
    scenarios: Vec<String>,
}

impl<S: TransactionalStore> Driver<S> {
    /// Driver with the default configuration
    pub fn new(store: S) -> Self {
        Self {
            store,
            orchestrator: Orchestrator::new(IsolationLevel::Serializable),
            seed: ProbeConfig::default().seed,
            repeat: 1,
            scenarios: Vec::new(),
        }
    }

    /// Driver configured from a [`ProbeConfig`]
    ///
    /// # Errors
    /// - `Store(InvalidConfig)` if the configuration does not validate
    /// - `UnknownScenario` for a selected name not in the catalog
    /// - `SeedMismatch` if the seed lacks rows a selected scenario reads
    pub fn from_config(store: S, config: &ProbeConfig) -> Result<Self> {
        config.validate()?;
        let driver = Self {
            store,
            orchestrator: Orchestrator::new(config.isolation_level()?)
                .with_barrier_timeout(config.barrier_timeout()),
            seed: config.seed.clone(),
            repeat: config.repeat,
            scenarios: config.scenarios.clone(),
        };
        for scenario in driver.selected()? {
            driver.check_seed(&scenario)?;
        }
        Ok(driver)
    }

    /// The store the driver runs against
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The orchestrator used for every run
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Replace the table contents with the seed rows
    pub fn seed(&self) -> Result<()> {
        let mut txn = self.store.begin()?;
        if let Err(e) = insert_seed(&mut txn, &self.seed) {
            if let Err(rollback) = txn.rollback() {
                warn!(target: "ssiprobe::driver", error = %rollback, "seed rollback failed");
            }
            return Err(e.into());
        }
        txn.commit()?;
        info!(target: "ssiprobe::driver", rows = self.seed.len(), "table seeded");
        Ok(())
    }

    /// Read the committed table in a read-only transaction
    pub fn final_state(&self) -> Result<FinalState> {
        let mut txn = self.store.begin()?;
        let rows = txn.execute(&Statement::SelectAll)?;
        txn.commit()?;
        Ok(FinalState::new(rows.rows().map(<[_]>::to_vec).unwrap_or_default()))
    }

    /// Fail if the seed lacks rows `scenario` reads
    pub fn check_seed(&self, scenario: &Scenario) -> Result<()> {
        let missing = scenario.missing_rows(&self.seed);
        if missing.is_empty() {
            return Ok(());
        }
        Err(HarnessError::SeedMismatch {
            scenario: scenario.name().to_string(),
            missing,
        })
    }

    /// Run `scenario` `repeat` times, reseeding before each run
    pub fn run_scenario(&self, scenario: &Scenario) -> Result<Vec<RunRecord>> {
        self.check_seed(scenario)?;
        info!(target: "ssiprobe::driver", "==== Starting {} test...", scenario.name());
        let mut records = Vec::with_capacity(self.repeat as usize);
        for iteration in 0..self.repeat {
            self.seed()?;
            let report = self.orchestrator.run(&self.store, scenario)?;
            let final_state = self.final_state()?;
            let outcome = report.class();
            let check_error = scenario
                .final_check()
                .and_then(|check| check(&final_state, &outcome, &self.seed).err());

            let record = RunRecord {
                report,
                outcome,
                final_state,
                check_error,
            };
            if record.passed() {
                info!(
                    target: "ssiprobe::driver",
                    scenario = scenario.name(),
                    iteration,
                    %outcome,
                    rows = ?record.final_state.names(),
                    "run passed"
                );
            } else {
                error!(
                    target: "ssiprobe::driver",
                    scenario = scenario.name(),
                    iteration,
                    %outcome,
                    rows = ?record.final_state.names(),
                    check = record.check_error.as_deref().unwrap_or("ok"),
                    "run failed"
                );
            }
            records.push(record);
        }
        info!(target: "ssiprobe::driver", "==== {} completed ====", scenario.name());
        Ok(records)
    }

    /// Scenarios selected by configuration, in catalog order
    ///
    /// # Errors
    /// `UnknownScenario` for a name not in the catalog.
    pub fn selected(&self) -> Result<Vec<Scenario>> {
        if self.scenarios.is_empty() {
            return Ok(catalog::all());
        }
        let mut selected = Vec::with_capacity(self.scenarios.len());
        for name in &self.scenarios {
            let scenario =
                catalog::by_name(name).ok_or_else(|| HarnessError::UnknownScenario(name.clone()))?;
            selected.push(scenario);
        }
        let order = |s: &Scenario| catalog::NAMES.iter().position(|n| *n == s.name());
        selected.sort_by_key(order);
        selected.dedup_by(|a, b| a.name() == b.name());
        Ok(selected)
    }

    /// Run every selected scenario
    pub fn run_catalog(&self) -> Result<DriverReport> {
        let mut report = DriverReport::default();
        for scenario in self.selected()? {
            report.runs.extend(self.run_scenario(&scenario)?);
        }
        Ok(report)
    }
}

fn insert_seed<T: StoreTransaction>(txn: &mut T, seed: &[String]) -> ssiprobe_core::Result<()> {
    txn.execute(&Statement::DeleteAll)?;
    for name in seed {
        txn.execute(&Statement::insert(name.as_str()))?;
    }
    Ok(())
}
