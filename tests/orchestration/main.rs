//! Orchestration Integration Tests
//!
//! Failure injection, barrier timeouts and configuration loading.

#[path = "../common/mod.rs"]
mod common;

mod configuration;
mod failures;
mod signals;
mod timeouts;
