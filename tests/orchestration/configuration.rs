//! Loading a probe configuration from disk

use std::fs;

use tempfile::TempDir;

use crate::common::*;

#[test]
fn driver_runs_what_the_file_selects() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(ssiprobe::CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
isolation = "repeatable-read"
repeat = 2
scenarios = ["write-skew"]
barrier_timeout_ms = 5000
"#,
    )
    .unwrap();

    let config = ProbeConfig::from_file(&path).unwrap();
    let driver = Driver::from_config(MemoryStore::new(), &config).unwrap();
    assert_eq!(driver.orchestrator().isolation(), IsolationLevel::RepeatableRead);

    let report = driver.run_catalog().unwrap();
    assert_eq!(report.runs.len(), 2);
    assert!(report
        .runs
        .iter()
        .all(|r| r.outcome == OutcomeClass::BothCommitted));
}

#[test]
fn custom_seed_is_used_for_every_run() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("probe.toml");
    fs::write(
        &path,
        r#"
scenarios = ["phantom-read"]
seed = ["Alice", "Bob", "Zed"]
"#,
    )
    .unwrap();

    let config = ProbeConfig::from_file(&path).unwrap();
    let record = Driver::from_config(MemoryStore::new(), &config)
        .unwrap()
        .run_catalog()
        .unwrap()
        .runs
        .remove(0);
    assert!(record.passed());
    assert!(record.final_state.contains("Zed"));
    assert_eq!(record.final_state.rows().len(), 4);
}

#[test]
fn invalid_isolation_in_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("probe.toml");
    fs::write(&path, "isolation = \"chaos\"\n").unwrap();

    let err = ProbeConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ssiprobe::Error::InvalidConfig(_)), "{}", err);
}

#[test]
fn driver_rejects_an_unvalidated_config() {
    let config = ProbeConfig {
        repeat: 0,
        ..ProbeConfig::default()
    };
    assert!(Driver::from_config(MemoryStore::new(), &config).is_err());
}

#[test]
fn default_file_is_written_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(ssiprobe::CONFIG_FILE_NAME);
    ProbeConfig::write_default_if_missing(&path).unwrap();
    let config = ProbeConfig::from_file(&path).unwrap();
    assert_eq!(config, ProbeConfig::default());
}
