//! ssiprobe - barrier-driven reproduction of transaction isolation anomalies
//!
//! ssiprobe forces two transactions through aligned read, write and commit
//! phases so that a dirty-read, phantom or write-skew dependency cycle exists
//! at a known moment, then checks that serializable isolation aborts exactly
//! one of them.
//!
//! # Quick Start
//!
//! ```
//! use ssiprobe::{Driver, MemoryStore};
//!
//! let driver = Driver::new(MemoryStore::new());
//! let report = driver.run_catalog().unwrap();
//! assert!(report.passed());
//! ```
//!
//! # Architecture
//!
//! - `ssiprobe-core`: statements, isolation levels, store traits, config
//! - `ssiprobe-storage` / `ssiprobe-concurrency`: the in-memory store
//! - `ssiprobe-harness`: barriers, roles, orchestrator, scenario catalog
//! - this crate: the [`Driver`] and the `ssiprobe` binary

pub mod driver;

pub use driver::{Driver, DriverReport, RunRecord};
pub use ssiprobe_concurrency::{Fault, MemoryStore};
pub use ssiprobe_core::{
    Error, IsolationLevel, ProbeConfig, Role, Statement, StoreTransaction, TransactionalStore,
    CONFIG_FILE_NAME,
};
pub use ssiprobe_harness::{
    catalog, HarnessError, Orchestrator, OutcomeClass, Phase, Release, RoleOutcome, RoleScript,
    Scenario, ScenarioReport,
};
