//! Exactly two completion signals per run

use crate::common::*;

fn panicking_winner() -> Scenario {
    Scenario::new(
        "panicking-winner",
        RoleScript::fixed(vec![Statement::select_by_name("Alice")], vec![]),
        RoleScript::new(vec![Statement::select_by_name("Bob")], |_| {
            panic!("write builder exploded")
        }),
    )
}

#[test]
fn every_run_signals_twice() {
    let store = alice_and_bob();
    let orchestrator = Orchestrator::new(IsolationLevel::Serializable);
    for scenario in catalog::all() {
        let report = orchestrator.run(&store, &scenario).unwrap();
        assert_eq!(report.signals, 2, "{}", scenario.name());
    }
}

#[test]
fn panicking_role_still_signals() {
    let store = alice_and_bob();
    let report = Orchestrator::new(IsolationLevel::Serializable)
        .run(&store, &panicking_winner())
        .unwrap();

    assert_eq!(report.signals, 2);
    assert!(report.loser.is_committed());
    match &report.winner {
        RoleOutcome::RolledBack { phase, error } => {
            assert_eq!(*phase, Phase::Write);
            assert!(error.contains("panicked"));
        }
        RoleOutcome::Committed => panic!("panicking role committed"),
    }
    // The panicking role's transaction was aborted on drop
    assert_eq!(committed_names(&store), ["Alice", "Bob"]);
}

#[test]
fn report_serializes_outcomes_with_status_tags() {
    let record = run_once(IsolationLevel::Serializable, catalog::WRITE_SKEW);
    let json = serde_json::to_value(&record).unwrap();
    let statuses = [
        json["loser"]["status"].as_str().unwrap(),
        json["winner"]["status"].as_str().unwrap(),
    ];
    assert!(statuses.contains(&"committed"));
    assert!(statuses.contains(&"rolled-back"));
    assert_eq!(json["outcome"]["class"], "one-winner");
    assert_eq!(json["signals"], 2);
}
