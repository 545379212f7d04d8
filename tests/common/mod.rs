//! Shared test utilities for the root integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::thread;
use std::time::Duration;

pub use ssiprobe::{
    catalog, Driver, Fault, IsolationLevel, MemoryStore, Orchestrator, OutcomeClass, Phase,
    ProbeConfig, Release, Role, RoleOutcome, RoleScript, RunRecord, Scenario, Statement,
    StoreTransaction, TransactionalStore,
};
use ssiprobe_core::{Result, StatementResult};

// ============================================================================
// Stores
// ============================================================================

/// Memory store holding `names`, committed in one transaction
pub fn seeded_store(names: &[&str]) -> MemoryStore {
    let store = MemoryStore::new();
    let mut txn = store.begin().unwrap();
    for name in names {
        txn.execute(&Statement::insert(*name)).unwrap();
    }
    txn.commit().unwrap();
    store
}

/// Memory store holding Alice and Bob
pub fn alice_and_bob() -> MemoryStore {
    seeded_store(&["Alice", "Bob"])
}

/// Committed names, sorted
pub fn committed_names(store: &MemoryStore) -> Vec<String> {
    let mut names: Vec<String> = store
        .committed_rows()
        .into_iter()
        .map(|row| row.name)
        .collect();
    names.sort();
    names
}

// ============================================================================
// Drivers
// ============================================================================

/// Config running `scenario` once at `isolation`
pub fn config(isolation: IsolationLevel, scenario: &str) -> ProbeConfig {
    ProbeConfig {
        isolation: isolation.as_str().to_string(),
        scenarios: vec![scenario.to_string()],
        ..ProbeConfig::default()
    }
}

/// Driver over a fresh memory store
pub fn driver(config: &ProbeConfig) -> Driver<MemoryStore> {
    Driver::from_config(MemoryStore::new(), config).unwrap()
}

/// Run one catalog scenario once and return its record
pub fn run_once(isolation: IsolationLevel, scenario: &str) -> RunRecord {
    let driver = driver(&config(isolation, scenario));
    let mut report = driver.run_catalog().unwrap();
    assert_eq!(report.runs.len(), 1);
    report.runs.remove(0)
}

/// The role that committed in a one-winner run
pub fn sole_committer(record: &RunRecord) -> Role {
    match record.outcome {
        OutcomeClass::OneWinner { committed } => committed,
        other => panic!("expected one winner, got {}", other),
    }
}

/// Assert that the rolled-back role failed at commit with a serialization failure
pub fn assert_serialization_loser(record: &RunRecord) {
    let loser = sole_committer(record).other();
    match record.report.outcome(loser) {
        RoleOutcome::RolledBack { phase, error } => {
            assert_eq!(*phase, Phase::Commit, "{} failed early: {}", loser, error);
            assert!(
                error.contains("could not serialize access"),
                "unexpected error: {}",
                error
            );
        }
        RoleOutcome::Committed => unreachable!(),
    }
}

// ============================================================================
// SlowStore - delays one statement
// ============================================================================

/// Memory store wrapper that sleeps before executing one chosen statement
#[derive(Clone)]
pub struct SlowStore {
    pub inner: MemoryStore,
    slow: Statement,
    delay: Duration,
}

impl SlowStore {
    pub fn new(inner: MemoryStore, slow: Statement, delay: Duration) -> Self {
        Self { inner, slow, delay }
    }
}

pub struct SlowTransaction {
    inner: <MemoryStore as TransactionalStore>::Transaction,
    slow: Statement,
    delay: Duration,
}

impl TransactionalStore for SlowStore {
    type Transaction = SlowTransaction;

    fn begin(&self) -> Result<SlowTransaction> {
        Ok(SlowTransaction {
            inner: self.inner.begin()?,
            slow: self.slow.clone(),
            delay: self.delay,
        })
    }
}

impl StoreTransaction for SlowTransaction {
    fn id(&self) -> u64 {
        self.inner.id()
    }

    fn isolation_level(&self) -> IsolationLevel {
        self.inner.isolation_level()
    }

    fn set_isolation_level(&mut self, level: IsolationLevel) -> Result<()> {
        self.inner.set_isolation_level(level)
    }

    fn execute(&mut self, statement: &Statement) -> Result<StatementResult> {
        if *statement == self.slow {
            thread::sleep(self.delay);
        }
        self.inner.execute(statement)
    }

    fn commit(self) -> Result<()> {
        self.inner.commit()
    }

    fn rollback(self) -> Result<()> {
        self.inner.rollback()
    }
}
