//! Store failures at each phase

use crate::common::*;

fn serializable() -> Orchestrator {
    Orchestrator::new(IsolationLevel::Serializable)
}

#[test]
fn begin_failure_for_first_role_launches_nothing() {
    let store = alice_and_bob();
    store.inject(Fault::Begin { nth: 0 });
    let report = serializable().run(&store, &catalog::write_skew()).unwrap();

    assert_eq!(report.class(), OutcomeClass::BothFailed);
    for role in Role::ALL {
        assert_eq!(report.outcome(role).failed_phase(), Some(Phase::Open));
    }
    assert!(report.releases.is_empty());
    assert_eq!(store.stats().rolled_back, 0);
    assert_eq!(committed_names(&store), ["Alice", "Bob"]);
}

#[test]
fn begin_failure_for_second_role_rolls_back_the_first() {
    let store = alice_and_bob();
    store.inject(Fault::Begin { nth: 1 });
    let report = serializable().run(&store, &catalog::write_skew()).unwrap();

    assert_eq!(report.class(), OutcomeClass::BothFailed);
    assert_eq!(report.signals, 2);
    assert_eq!(store.stats().rolled_back, 1);
    match &report.loser {
        RoleOutcome::RolledBack { error, .. } => assert!(error.contains("not launched")),
        RoleOutcome::Committed => panic!("loser should not have run"),
    }
}

#[test]
fn isolation_failure_is_confined_to_one_role() {
    let store = alice_and_bob();
    store.inject(Fault::SetIsolation { nth: 0 });
    let report = serializable().run(&store, &catalog::write_skew()).unwrap();

    let failed: Vec<Role> = Role::ALL
        .into_iter()
        .filter(|r| report.outcome(*r).failed_phase() == Some(Phase::Isolation))
        .collect();
    assert_eq!(failed.len(), 1);
    let survivor = failed[0].other();
    assert!(report.outcome(survivor).is_committed());
    assert_eq!(
        report.releases[0].release,
        Release::Abandoned { party: failed[0] }
    );
}

#[test]
fn weaker_level_skips_the_isolation_change() {
    let store = alice_and_bob();
    store.inject(Fault::SetIsolation { nth: 0 });
    let report = Orchestrator::new(IsolationLevel::ReadCommitted)
        .run(&store, &catalog::write_skew())
        .unwrap();
    assert_eq!(report.class(), OutcomeClass::BothCommitted);
}

#[test]
fn write_failure_abandons_write_done_only() {
    let store = alice_and_bob();
    store.inject(Fault::Statement(Statement::insert("Charlie")));
    let report = serializable()
        .run(&store, &catalog::phantom_read())
        .unwrap();

    assert_eq!(report.loser.failed_phase(), Some(Phase::Write));
    assert!(report.winner.is_committed());
    assert_eq!(report.releases[0].release, Release::Proceed);
    assert_eq!(
        report.releases[1].release,
        Release::Abandoned { party: Role::Loser }
    );
    assert_eq!(committed_names(&store), ["Alice", "Bob", "Diana"]);
}

#[test]
fn read_failure_of_both_roles_fails_the_run() {
    let store = alice_and_bob();
    store.inject(Fault::Statement(Statement::select_by_name("Alice")));
    let report = serializable().run(&store, &catalog::dirty_read()).unwrap();

    assert_eq!(report.class(), OutcomeClass::BothFailed);
    for role in Role::ALL {
        assert_eq!(report.outcome(role).failed_phase(), Some(Phase::Read));
    }
    assert_eq!(
        report.releases[0].release,
        Release::Abandoned { party: Role::Loser }
    );
    assert_eq!(store.stats().committed, 1);
}
