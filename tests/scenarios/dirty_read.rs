//! dirty-read: store-side concatenation over a read-write cycle

use crate::common::*;

#[test]
fn serializable_aborts_exactly_one_role() {
    let record = run_once(IsolationLevel::Serializable, catalog::DIRTY_READ);
    assert!(record.passed(), "{:?}", record.check_error);
    assert!(record.outcome.is_one_winner());
    assert_serialization_loser(&record);
}

#[test]
fn committed_update_sees_the_original_row() {
    let record = run_once(IsolationLevel::Serializable, catalog::DIRTY_READ);
    let names = record.final_state.names();
    let expected = match sole_committer(&record) {
        Role::Loser => ["Alice_saw_Bob", "Bob"],
        Role::Winner => ["Alice", "Bob_saw_Alice"],
    };
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, expected);
}

#[test]
fn both_barriers_release_normally() {
    let record = run_once(IsolationLevel::Serializable, catalog::DIRTY_READ);
    let barriers: Vec<_> = record.report.releases.iter().map(|r| r.barrier).collect();
    assert_eq!(barriers, ["ready", "write-done"]);
    assert!(record
        .report
        .releases
        .iter()
        .all(|r| r.release == Release::Proceed && !r.timed_out));
    assert_eq!(record.report.signals, 2);
}
