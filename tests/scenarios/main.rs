//! Scenario Integration Tests
//!
//! Runs the built-in anomaly catalog end to end through the driver.

#[path = "../common/mod.rs"]
mod common;

mod dirty_read;
mod idempotence;
mod isolation_levels;
mod phantom_read;
mod write_skew;
