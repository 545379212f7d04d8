//! write-skew: overlapping reads, disjoint writes

use crate::common::*;

#[test]
fn serializable_aborts_exactly_one_role() {
    let record = run_once(IsolationLevel::Serializable, catalog::WRITE_SKEW);
    assert!(record.passed(), "{:?}", record.check_error);
    assert_serialization_loser(&record);
}

#[test]
fn final_state_reflects_only_the_committer() {
    let record = run_once(IsolationLevel::Serializable, catalog::WRITE_SKEW);
    let committer = sole_committer(&record);
    let (kept, skipped) = match committer {
        Role::Loser => ("Alice_saw_Bob", "Bob_saw_Alice"),
        Role::Winner => ("Bob_saw_Alice", "Alice_saw_Bob"),
    };
    assert!(record.final_state.contains(kept));
    assert!(!record.final_state.contains(skipped));
}

#[test]
fn snapshot_isolation_admits_the_skew() {
    let record = run_once(IsolationLevel::RepeatableRead, catalog::WRITE_SKEW);
    assert_eq!(record.outcome, OutcomeClass::BothCommitted);
    assert!(record.final_state.contains("Alice_saw_Bob"));
    assert!(record.final_state.contains("Bob_saw_Alice"));
}
