//! Built-in anomaly scenarios
//!
//! `dirty-read` and `write-skew` need `Alice` and `Bob` in the seed. Other
//! seeded rows are left alone by every scenario and ignored by the checks.
//!
//! | Name | Reads | Loser writes | Winner writes |
//! |---|---|---|---|
//! | `dirty-read` | Alice, Bob | `Alice := 'Alice_saw_' \|\| bob` | `Bob := 'Bob_saw_' \|\| alice` |
//! | `phantom-read` | count A..=M | insert Charlie | insert Diana |
//! | `write-skew` | Alice, Bob | `Alice := "Alice_saw_<bob>"` | `Bob := "Bob_saw_<alice>"` |

use crate::scenario::{RoleScript, Scenario};
use crate::verify::{expect_range_count, expect_updates, FinalState, OutcomeClass};
use ssiprobe_core::Statement;

/// Name of the dirty-read-style scenario
pub const DIRTY_READ: &str = "dirty-read";
/// Name of the phantom-read scenario
pub const PHANTOM_READ: &str = "phantom-read";
/// Name of the write-skew scenario
pub const WRITE_SKEW: &str = "write-skew";

/// Catalog names, in run order
pub const NAMES: [&str; 3] = [DIRTY_READ, PHANTOM_READ, WRITE_SKEW];

const RANGE: (&str, &str) = ("A", "M");
const PAIR: [&str; 2] = ["Alice", "Bob"];

fn read_both() -> Vec<Statement> {
    PAIR.iter().map(|name| Statement::select_by_name(*name)).collect()
}

/// Both roles read Alice and Bob; each updates its own row with a
/// store-side concatenation of the other row's value
pub fn dirty_read() -> Scenario {
    let loser = RoleScript::new(read_both(), |view| {
        let bob = view.single_name(1)?;
        Ok(vec![Statement::update_concat("Alice", "Alice_saw_", bob)])
    });
    let winner = RoleScript::new(read_both(), |view| {
        let alice = view.single_name(0)?;
        Ok(vec![Statement::update_concat("Bob", "Bob_saw_", alice)])
    });
    Scenario::new(DIRTY_READ, loser, winner)
        .with_description("symmetric read-write dependency cycle on Alice and Bob")
        .with_final_check(check_cross_updates)
        .with_required_rows(PAIR)
}

/// Both roles count the range A..=M, insert one row into it and count again
pub fn phantom_read() -> Scenario {
    let count = || vec![Statement::count_range(RANGE.0, RANGE.1)];
    let loser =
        RoleScript::fixed(count(), vec![Statement::insert("Charlie")]).with_recheck(count());
    let winner =
        RoleScript::fixed(count(), vec![Statement::insert("Diana")]).with_recheck(count());
    Scenario::new(PHANTOM_READ, loser, winner)
        .with_description("inserts into a range both roles counted")
        .with_final_check(check_range_count)
}

/// Both roles read Alice and Bob; each writes a different row with a
/// client-computed value embedding the other row
pub fn write_skew() -> Scenario {
    let loser = RoleScript::new(read_both(), |view| {
        let bob = view.single_name(1)?;
        Ok(vec![Statement::update_literal(
            "Alice",
            format!("Alice_saw_{}", bob),
        )])
    });
    let winner = RoleScript::new(read_both(), |view| {
        let alice = view.single_name(0)?;
        Ok(vec![Statement::update_literal(
            "Bob",
            format!("Bob_saw_{}", alice),
        )])
    });
    Scenario::new(WRITE_SKEW, loser, winner)
        .with_description("overlapping reads, disjoint writes")
        .with_final_check(check_cross_updates)
        .with_required_rows(PAIR)
}

fn check_cross_updates(
    state: &FinalState,
    class: &OutcomeClass,
    _seed: &[String],
) -> Result<(), String> {
    expect_updates(
        state,
        class,
        [("Alice", "Alice_saw_Bob"), ("Bob", "Bob_saw_Alice")],
    )
}

fn check_range_count(
    state: &FinalState,
    class: &OutcomeClass,
    seed: &[String],
) -> Result<(), String> {
    expect_range_count(state, class, RANGE, seed)
}

/// Every built-in scenario, in run order
pub fn all() -> Vec<Scenario> {
    vec![dirty_read(), phantom_read(), write_skew()]
}

/// Look a scenario up by name
///
/// Case-insensitive; `_` and ` ` are accepted for `-`.
pub fn by_name(name: &str) -> Option<Scenario> {
    let normalized = name.trim().to_ascii_lowercase().replace(['_', ' '], "-");
    match normalized.as_str() {
        DIRTY_READ => Some(dirty_read()),
        PHANTOM_READ => Some(phantom_read()),
        WRITE_SKEW => Some(write_skew()),
        _ => None,
    }
}
