//! PhaseBarrier: one-shot two-party rendezvous
//!
//! A barrier has one slot per [`Role`]. Each party arrives exactly once; the
//! orchestrator waits until no slot is pending and then broadcasts the
//! release to both waiters.
//!
//! ```text
//!   Loser ──arrive──┐                           ┌──await_release──▶ Release
//!                   ├─▶ wait_for_arrivals ─▶ release
//!   Winner ─arrive──┘                           └──await_release──▶ Release
//! ```
//!
//! # Abandonment
//!
//! A party that will never arrive (its role failed earlier) abandons its
//! slot, normally by dropping its [`BarrierTicket`]. The release then reports
//! [`Release::Abandoned`] instead of [`Release::Proceed`], and the surviving
//! party decides what to do with that.
//!
//! With a timeout, `wait_for_arrivals` force-abandons slots that are still
//! pending at the deadline. A late arrival is rejected.
//!
//! # Invariants
//!
//! - `Release::Proceed` is only ever produced with both slots arrived
//! - `release()` refuses to run while a slot is pending
//! - once both slots are arrived or abandoned, `release()` always succeeds,
//!   so no waiter can block forever

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use ssiprobe_core::Role;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Broadcast outcome of a barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Release {
    /// Both parties arrived
    Proceed,
    /// A party abandoned the barrier (Loser named first if both did)
    Abandoned {
        /// Party that did not arrive
        party: Role,
    },
}

impl Release {
    /// Whether both parties arrived
    pub fn is_proceed(&self) -> bool {
        matches!(self, Release::Proceed)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Release::Proceed => f.write_str("proceed"),
            Release::Abandoned { party } => write!(f, "abandoned by {}", party),
        }
    }
}

/// Errors reported by [`PhaseBarrier`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BarrierError {
    /// A party arrived twice
    #[error("{party} already arrived at barrier '{barrier}'")]
    AlreadyArrived {
        /// Barrier name
        barrier: &'static str,
        /// Offending party
        party: Role,
    },

    /// A party arrived after its slot was abandoned
    #[error("{party} arrived at barrier '{barrier}' after being abandoned")]
    Abandoned {
        /// Barrier name
        barrier: &'static str,
        /// Late party
        party: Role,
    },

    /// The arrival wait hit its deadline; pending slots were abandoned
    #[error("barrier '{barrier}' timed out after {waited:?} waiting for {pending:?}")]
    Timeout {
        /// Barrier name
        barrier: &'static str,
        /// How long the orchestrator waited
        waited: Duration,
        /// Parties that were force-abandoned
        pending: Vec<Role>,
    },

    /// Release was requested while a slot was still pending
    #[error("barrier '{barrier}' cannot release while {pending:?} pending")]
    NotReady {
        /// Barrier name
        barrier: &'static str,
        /// Parties not yet arrived nor abandoned
        pending: Vec<Role>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Pending,
    Arrived,
    Abandoned,
}

#[derive(Debug)]
struct BarrierState {
    slots: [Slot; 2],
    release: Option<Release>,
}

impl BarrierState {
    fn pending(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.slots[r.index()] == Slot::Pending)
            .collect()
    }

    /// Release status once no slot is pending
    fn outcome(&self) -> Release {
        Role::ALL
            .into_iter()
            .find(|r| self.slots[r.index()] == Slot::Abandoned)
            .map(|party| Release::Abandoned { party })
            .unwrap_or(Release::Proceed)
    }
}

/// One-shot rendezvous of the Loser and the Winner
#[derive(Debug)]
pub struct PhaseBarrier {
    name: &'static str,
    state: Mutex<BarrierState>,
    /// Signalled on every arrival or abandonment
    settled: Condvar,
    /// Signalled once on release
    released: Condvar,
}

impl PhaseBarrier {
    /// Create a barrier with both slots pending
    pub fn new(name: &'static str) -> Self {
        PhaseBarrier {
            name,
            state: Mutex::new(BarrierState {
                slots: [Slot::Pending; 2],
                release: None,
            }),
            settled: Condvar::new(),
            released: Condvar::new(),
        }
    }

    /// Barrier name used in logs and reports
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Hand out the ticket for one party
    pub fn ticket(&self, party: Role) -> BarrierTicket<'_> {
        BarrierTicket {
            barrier: self,
            party,
        }
    }

    /// Record the arrival of `party`
    ///
    /// # Errors
    /// - `AlreadyArrived` on a second arrival
    /// - `Abandoned` if the slot was abandoned (for example by a timeout)
    pub fn arrive(&self, party: Role) -> Result<(), BarrierError> {
        let mut state = self.state.lock();
        match state.slots[party.index()] {
            Slot::Pending => {
                state.slots[party.index()] = Slot::Arrived;
                debug!(target: "ssiprobe::barrier", barrier = self.name, role = %party, "arrived");
                self.settled.notify_all();
                Ok(())
            }
            Slot::Arrived => Err(BarrierError::AlreadyArrived {
                barrier: self.name,
                party,
            }),
            Slot::Abandoned => Err(BarrierError::Abandoned {
                barrier: self.name,
                party,
            }),
        }
    }

    /// Declare that `party` will never arrive
    ///
    /// Returns `true` if the slot was pending. No-op for a slot that already
    /// arrived or was abandoned.
    pub fn abandon(&self, party: Role) -> bool {
        let mut state = self.state.lock();
        if state.slots[party.index()] != Slot::Pending {
            return false;
        }
        state.slots[party.index()] = Slot::Abandoned;
        debug!(target: "ssiprobe::barrier", barrier = self.name, role = %party, "abandoned");
        self.settled.notify_all();
        true
    }

    /// Block until no slot is pending
    ///
    /// With a timeout, slots still pending at the deadline are abandoned and
    /// `Timeout` is returned; the barrier can then be released.
    pub fn wait_for_arrivals(&self, timeout: Option<Duration>) -> Result<(), BarrierError> {
        let start = Instant::now();
        let deadline = timeout.map(|t| start + t);
        let mut state = self.state.lock();

        while !state.pending().is_empty() {
            match deadline {
                None => self.settled.wait(&mut state),
                Some(deadline) => {
                    if self.settled.wait_until(&mut state, deadline).timed_out()
                        && !state.pending().is_empty()
                    {
                        let pending = state.pending();
                        for party in &pending {
                            state.slots[party.index()] = Slot::Abandoned;
                        }
                        let waited = start.elapsed();
                        warn!(
                            target: "ssiprobe::barrier",
                            barrier = self.name,
                            ?pending,
                            waited_ms = waited.as_millis() as u64,
                            "timed out waiting for arrivals"
                        );
                        return Err(BarrierError::Timeout {
                            barrier: self.name,
                            waited,
                            pending,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Broadcast the release to both waiters
    ///
    /// Calling it again returns the same release.
    ///
    /// # Errors
    /// `NotReady` while a slot is pending.
    pub fn release(&self) -> Result<Release, BarrierError> {
        let mut state = self.state.lock();
        if let Some(release) = state.release {
            return Ok(release);
        }

        let pending = state.pending();
        if !pending.is_empty() {
            return Err(BarrierError::NotReady {
                barrier: self.name,
                pending,
            });
        }

        let release = state.outcome();
        state.release = Some(release);
        debug!(target: "ssiprobe::barrier", barrier = self.name, %release, "released");
        self.released.notify_all();
        Ok(release)
    }

    /// Abandon every pending slot and release
    ///
    /// Unblocks both waiters whatever the arrivals. An already released
    /// barrier keeps its release.
    pub fn force_release(&self) -> Release {
        let mut state = self.state.lock();
        if let Some(release) = state.release {
            return release;
        }
        for party in state.pending() {
            state.slots[party.index()] = Slot::Abandoned;
        }
        let release = state.outcome();
        state.release = Some(release);
        warn!(target: "ssiprobe::barrier", barrier = self.name, %release, "forced release");
        self.settled.notify_all();
        self.released.notify_all();
        release
    }

        /// Block until the barrier is released
    pub fn await_release(&self) -> Release {
        let mut state = self.state.lock();
        loop {
            if let Some(release) = state.release {
                return release;
            }
            self.released.wait(&mut state);
        }
    }

    /// The release, if it already happened
    pub fn released(&self) -> Option<Release> {
        self.state.lock().release
    }

    /// Number of parties that arrived
    pub fn arrivals(&self) -> usize {
        self.state
            .lock()
            .slots
            .iter()
            .filter(|s| **s == Slot::Arrived)
            .count()
    }
}

/// A party's handle on one barrier
///
/// Dropping the ticket abandons the slot unless the party already arrived,
/// so a role that exits early on any path never leaves the other party
/// waiting.
#[derive(Debug)]
pub struct BarrierTicket<'a> {
    barrier: &'a PhaseBarrier,
    party: Role,
}

impl<'a> BarrierTicket<'a> {
    /// Party holding the ticket
    pub fn party(&self) -> Role {
        self.party
    }

    /// Barrier name
    pub fn barrier_name(&self) -> &'static str {
        self.barrier.name
    }

    /// Arrive at the barrier
    pub fn arrive(&self) -> Result<(), BarrierError> {
        self.barrier.arrive(self.party)
    }

    /// Wait for the orchestrator's release
    pub fn await_release(&self) -> Release {
        self.barrier.await_release()
    }
}

impl Drop for BarrierTicket<'_> {
    fn drop(&mut self) {
        self.barrier.abandon(self.party);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_both_arrive_then_proceed() {
        let barrier = PhaseBarrier::new("ready");
        barrier.arrive(Role::Loser).unwrap();
        barrier.arrive(Role::Winner).unwrap();
        barrier.wait_for_arrivals(None).unwrap();
        assert_eq!(barrier.release().unwrap(), Release::Proceed);
        assert_eq!(barrier.await_release(), Release::Proceed);
        assert_eq!(barrier.arrivals(), 2);
    }

    #[test]
    fn test_double_arrival_rejected() {
        let barrier = PhaseBarrier::new("ready");
        barrier.arrive(Role::Winner).unwrap();
        assert_eq!(
            barrier.arrive(Role::Winner),
            Err(BarrierError::AlreadyArrived {
                barrier: "ready",
                party: Role::Winner
            })
        );
    }

    #[test]
    fn test_release_refused_while_pending() {
        let barrier = PhaseBarrier::new("ready");
        barrier.arrive(Role::Loser).unwrap();
        let err = barrier.release().unwrap_err();
        assert_eq!(
            err,
            BarrierError::NotReady {
                barrier: "ready",
                pending: vec![Role::Winner]
            }
        );
        assert!(barrier.released().is_none());
    }

    #[test]
    fn test_dropped_ticket_abandons() {
        let barrier = PhaseBarrier::new("write-done");
        barrier.ticket(Role::Loser).arrive().unwrap();
        drop(barrier.ticket(Role::Winner));
        barrier.wait_for_arrivals(None).unwrap();
        assert_eq!(
            barrier.release().unwrap(),
            Release::Abandoned {
                party: Role::Winner
            }
        );
    }

    #[test]
    fn test_arrived_ticket_drop_is_noop() {
        let barrier = PhaseBarrier::new("ready");
        {
            let ticket = barrier.ticket(Role::Loser);
            ticket.arrive().unwrap();
        }
        assert!(!barrier.abandon(Role::Loser));
        assert_eq!(barrier.arrivals(), 1);
    }

    #[test]
    fn test_force_release_unblocks_waiter() {
        let barrier = PhaseBarrier::new("ready");
        thread::scope(|s| {
            let ticket = barrier.ticket(Role::Winner);
            let waiter = s.spawn(move || {
                ticket.arrive().unwrap();
                ticket.await_release()
            });
            while barrier.arrivals() == 0 {
                thread::yield_now();
            }
            let release = barrier.force_release();
            assert_eq!(release, Release::Abandoned { party: Role::Loser });
            assert_eq!(waiter.join().unwrap(), release);
        });
        assert_eq!(
            barrier.arrive(Role::Loser),
            Err(BarrierError::Abandoned {
                barrier: "ready",
                party: Role::Loser
            })
        );
    }

    #[test]
    fn test_force_release_keeps_earlier_release() {
        let barrier = PhaseBarrier::new("write-done");
        barrier.arrive(Role::Loser).unwrap();
        barrier.arrive(Role::Winner).unwrap();
        assert_eq!(barrier.release().unwrap(), Release::Proceed);
        assert_eq!(barrier.force_release(), Release::Proceed);
    }

    #[test]
    fn test_both_abandoned_names_loser() {
        let barrier = PhaseBarrier::new("ready");
        barrier.abandon(Role::Winner);
        barrier.abandon(Role::Loser);
        assert_eq!(
            barrier.release().unwrap(),
            Release::Abandoned { party: Role::Loser }
        );
    }

    #[test]
    fn test_timeout_abandons_pending_and_rejects_late_arrival() {
        let barrier = PhaseBarrier::new("ready");
        barrier.arrive(Role::Loser).unwrap();
        let err = barrier
            .wait_for_arrivals(Some(Duration::from_millis(20)))
            .unwrap_err();
        assert!(matches!(err, BarrierError::Timeout { ref pending, .. } if pending == &vec![Role::Winner]));
        assert_eq!(
            barrier.release().unwrap(),
            Release::Abandoned {
                party: Role::Winner
            }
        );
        assert!(matches!(
            barrier.arrive(Role::Winner),
            Err(BarrierError::Abandoned { .. })
        ));
    }

    #[test]
    fn test_release_is_idempotent() {
        let barrier = PhaseBarrier::new("ready");
        barrier.abandon(Role::Loser);
        barrier.arrive(Role::Winner).unwrap();
        let first = barrier.release().unwrap();
        assert_eq!(barrier.release().unwrap(), first);
    }

    #[test]
    fn test_release_wakes_both_waiters() {
        let barrier = PhaseBarrier::new("ready");
        thread::scope(|s| {
            let waiters: Vec<_> = Role::ALL
                .into_iter()
                .map(|role| {
                    let ticket = barrier.ticket(role);
                    s.spawn(move || {
                        ticket.arrive().unwrap();
                        ticket.await_release()
                    })
                })
                .collect();

            barrier.wait_for_arrivals(None).unwrap();
            barrier.release().unwrap();
            for w in waiters {
                assert_eq!(w.join().unwrap(), Release::Proceed);
            }
        });
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Randomized arrival order and jitter: no waiter returns before the
        /// second arrival, and every waiter sees `Proceed`.
        #[test]
        fn prop_no_release_before_second_arrival(
            loser_delay_us in 0u64..2000,
            winner_delay_us in 0u64..2000,
        ) {
            let barrier = PhaseBarrier::new("ready");
            let arrived = AtomicUsize::new(0);
            let delays = [loser_delay_us, winner_delay_us];

            let observed: Vec<(usize, Release)> = thread::scope(|s| {
                let waiters: Vec<_> = Role::ALL
                    .into_iter()
                    .map(|role| {
                        let ticket = barrier.ticket(role);
                        let arrived = &arrived;
                        let delay = delays[role.index()];
                        s.spawn(move || {
                            let jitter = rand::thread_rng().gen_range(0..=delay);
                            thread::sleep(Duration::from_micros(jitter));
                            arrived.fetch_add(1, Ordering::SeqCst);
                            ticket.arrive().unwrap();
                            let release = ticket.await_release();
                            (arrived.load(Ordering::SeqCst), release)
                        })
                    })
                    .collect();

                barrier.wait_for_arrivals(None).unwrap();
                barrier.release().unwrap();
                waiters.into_iter().map(|w| w.join().unwrap()).collect()
            });

            for (seen, release) in observed {
                prop_assert_eq!(seen, 2);
                prop_assert_eq!(release, Release::Proceed);
            }
        }
    }
}
