//! The whole catalog under each isolation level

use crate::common::*;

fn run_all(isolation: IsolationLevel) -> ssiprobe::DriverReport {
    let config = ProbeConfig {
        isolation: isolation.as_str().to_string(),
        ..ProbeConfig::default()
    };
    driver(&config).run_catalog().unwrap()
}

#[test]
fn serializable_catalog_passes() {
    let report = run_all(IsolationLevel::Serializable);
    assert_eq!(report.runs.len(), catalog::NAMES.len());
    assert!(report.passed());
    assert!(report.runs.iter().all(|r| r.outcome.is_one_winner()));
}

#[test]
fn weaker_levels_let_both_roles_commit() {
    for isolation in [IsolationLevel::ReadCommitted, IsolationLevel::RepeatableRead] {
        let report = run_all(isolation);
        for run in &report.runs {
            assert_eq!(
                run.outcome,
                OutcomeClass::BothCommitted,
                "{} under {}",
                run.report.scenario,
                isolation
            );
            assert!(run.passed(), "{:?}", run.check_error);
        }
    }
}

#[test]
fn runs_follow_catalog_order() {
    let config = ProbeConfig {
        scenarios: vec!["write_skew".into(), "DIRTY-READ".into()],
        ..ProbeConfig::default()
    };
    let report = driver(&config).run_catalog().unwrap();
    let names: Vec<_> = report
        .runs
        .iter()
        .map(|r| r.report.scenario.as_str())
        .collect();
    assert_eq!(names, [catalog::DIRTY_READ, catalog::WRITE_SKEW]);
}

#[test]
fn unknown_scenario_is_rejected() {
    let config = ProbeConfig {
        scenarios: vec!["lost-update".into()],
        ..ProbeConfig::default()
    };
    let err = driver(&config).run_catalog().unwrap_err();
    assert!(matches!(err, ssiprobe::HarnessError::UnknownScenario(ref name) if name == "lost-update"));
}
