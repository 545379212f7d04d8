//! phantom-read: concurrent inserts into a counted range

use crate::common::*;

#[test]
fn serializable_aborts_exactly_one_inserter() {
    let record = run_once(IsolationLevel::Serializable, catalog::PHANTOM_READ);
    assert!(record.passed(), "{:?}", record.check_error);
    assert_serialization_loser(&record);
}

#[test]
fn final_range_count_is_three() {
    let record = run_once(IsolationLevel::Serializable, catalog::PHANTOM_READ);
    assert_eq!(record.final_state.count_in_range("A", "M"), 3);
    let inserted = match sole_committer(&record) {
        Role::Loser => "Charlie",
        Role::Winner => "Diana",
    };
    assert!(record.final_state.contains(inserted));
    assert_eq!(record.final_state.rows().len(), 3);
}

#[test]
fn repeatable_read_keeps_both_inserts() {
    let record = run_once(IsolationLevel::RepeatableRead, catalog::PHANTOM_READ);
    assert_eq!(record.outcome, OutcomeClass::BothCommitted);
    assert_eq!(record.final_state.count_in_range("A", "M"), 4);
    assert!(record.passed());
}
