//! Barrier timeouts against a slow store

use std::time::Duration;

use crate::common::*;

fn slow_loser() -> Scenario {
    Scenario::new(
        "slow-loser",
        RoleScript::fixed(vec![Statement::select_by_name("Bob")], vec![]),
        RoleScript::fixed(
            vec![Statement::select_by_name("Alice")],
            vec![Statement::insert("Charlie")],
        ),
    )
}

fn slow_store(delay: Duration) -> SlowStore {
    SlowStore::new(alice_and_bob(), Statement::select_by_name("Bob"), delay)
}

#[test]
fn late_role_is_abandoned_after_timeout() {
    let store = slow_store(Duration::from_millis(400));
    let report = Orchestrator::new(IsolationLevel::Serializable)
        .with_barrier_timeout(Some(Duration::from_millis(50)))
        .run(&store, &slow_loser())
        .unwrap();

    assert_eq!(report.releases.len(), 2);
    for release in &report.releases {
        assert!(release.timed_out, "{} did not time out", release.barrier);
        assert_eq!(release.release, Release::Abandoned { party: Role::Loser });
    }
    assert!(report.winner.is_committed());
    assert_eq!(report.loser.failed_phase(), Some(Phase::ReadySignal));
    assert_eq!(report.signals, 2);
    assert_eq!(committed_names(&store.inner), ["Alice", "Bob", "Charlie"]);
}

#[test]
fn without_timeout_the_orchestrator_waits() {
    let store = slow_store(Duration::from_millis(100));
    let report = Orchestrator::new(IsolationLevel::Serializable)
        .run(&store, &slow_loser())
        .unwrap();

    assert!(report
        .releases
        .iter()
        .all(|r| r.release == Release::Proceed && !r.timed_out));
    assert_eq!(report.class(), OutcomeClass::BothCommitted);
    assert!(report.elapsed_ms >= 100);
}

#[test]
fn generous_timeout_does_not_fire() {
    let store = slow_store(Duration::from_millis(20));
    let report = Orchestrator::new(IsolationLevel::Serializable)
        .with_barrier_timeout(Some(Duration::from_secs(10)))
        .run(&store, &slow_loser())
        .unwrap();
    assert!(report.releases.iter().all(|r| !r.timed_out));
}
