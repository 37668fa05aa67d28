//! Shared monitor for the run: simulation clock, single-order handoff slot,
//! run-end flag, and the driver status board.
//!
//! Everything lives behind one mutex. Three condition variables separate the
//! reasons a thread may be parked:
//!
//! * `tick`: the coordinator paces itself on it between clock advances;
//! * `slot_empty`: the restaurant waits for drivers to take the pending order;
//! * `slot_full`: drivers wait for an order, a clock change, or shutdown.
//!
//! Any thread that observes `clock >= run_limit` wakes every waiter on all
//! three conditions before it lets go of the lock.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, error, trace};

use crate::types::{Coordinate, DriverId, DriverSnapshot, DriverStatus, Order, OrderId};

struct DispatchState {
    clock: u64,
    slot: Option<Order>,
    run_end: bool,
    drivers: Vec<DriverSnapshot>,
    // Present only in validate mode.
    claimed: Option<HashSet<OrderId>>,
    duplicate_claim: bool,
}

impl DispatchState {
    fn record_claim(&mut self, id: OrderId) {
        if let Some(claimed) = self.claimed.as_mut() {
            if !claimed.insert(id) {
                error!("order {id} claimed more than once");
                self.duplicate_claim = true;
            }
        }
    }
}

/// Outcome of offering one record to the handoff slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handoff {
    /// The order now sits in the slot.
    Published(OrderId),
    /// Idle record accepted; the slot was left untouched.
    Idle,
    /// The clock ran out before the slot became free.
    Expired,
}

/// Outcome of a driver asking for work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    Order(Order),
    Expired,
}

/// Consistent view of the clock and every driver, taken under the lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub clock: u64,
    pub drivers: Vec<DriverSnapshot>,
}

impl BoardSnapshot {
    pub fn total_completed(&self) -> u64 {
        self.drivers.iter().map(|driver| driver.completed).sum()
    }
}

pub struct Dispatch {
    state: Mutex<DispatchState>,
    tick: Condvar,
    slot_empty: Condvar,
    slot_full: Condvar,
    run_limit: u64,
}

impl Dispatch {
    /// Create a monitor for `drivers` drivers that expires at `run_limit`.
    /// `validate` turns on duplicate-claim tracking.
    pub fn new(run_limit: u64, drivers: usize, validate: bool) -> Self {
        Self {
            state: Mutex::new(DispatchState {
                clock: 0,
                slot: None,
                run_end: false,
                drivers: (0..drivers).map(DriverSnapshot::new).collect(),
                claimed: validate.then(HashSet::new),
                duplicate_claim: false,
            }),
            tick: Condvar::new(),
            slot_empty: Condvar::new(),
            slot_full: Condvar::new(),
            run_limit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().expect("dispatch mutex poisoned")
    }

    fn wait<'a>(
        &self,
        condvar: &Condvar,
        guard: MutexGuard<'a, DispatchState>,
    ) -> MutexGuard<'a, DispatchState> {
        // Wait releases the lock and re-acquires it before returning.
        condvar.wait(guard).expect("condvar wait failed")
    }

    fn wake_all(&self) {
        self.tick.notify_all();
        self.slot_empty.notify_all();
        self.slot_full.notify_all();
    }

    pub fn clock(&self) -> u64 {
        self.lock().clock
    }

    pub fn is_expired(&self) -> bool {
        self.lock().clock >= self.run_limit
    }

    pub fn run_ended(&self) -> bool {
        self.lock().run_end
    }

    /// Advance the clock by one tick and wake every waiter. Coordinator only.
    pub fn advance_clock(&self) -> u64 {
        let mut guard = self.lock();
        guard.clock += 1;
        let now = guard.clock;
        trace!("clock advanced to {now}");
        self.wake_all();
        now
    }

    /// Block the coordinator for `period`, re-arming after every wakeup.
    pub fn pause(&self, period: Duration) {
        let deadline = Instant::now() + period;
        let mut guard = self.lock();
        loop {
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            let (next, _) = self
                .tick
                .wait_timeout(guard, deadline - now)
                .expect("condvar wait failed");
            guard = next;
        }
    }

    /// Offer the next record to the slot. `None` is an idle record.
    ///
    /// Blocks while a previous order is still waiting for a driver and the
    /// clock is live. Restaurant only.
    pub fn hand_off(&self, order: Option<Order>) -> Handoff {
        let mut guard = self.lock();
        while guard.slot.is_some() && guard.clock < self.run_limit {
            guard = self.wait(&self.slot_empty, guard);
        }
        if guard.clock >= self.run_limit {
            self.wake_all();
            return Handoff::Expired;
        }
        let outcome = match order {
            Some(order) => {
                debug_assert!(guard.slot.is_none(), "slot overwritten");
                guard.slot = Some(order);
                Handoff::Published(order.id)
            }
            None => Handoff::Idle,
        };
        self.tick.notify_all();
        self.slot_full.notify_all();
        outcome
    }

    /// Record that no further orders will be offered. Idempotent.
    pub fn mark_run_end(&self) {
        let mut guard = self.lock();
        if !guard.run_end {
            guard.run_end = true;
            debug!("order source exhausted at clock {}", guard.clock);
        }
        self.tick.notify_all();
        self.slot_full.notify_all();
    }

    /// Block until an order can be taken for `driver` or the clock expires.
    ///
    /// Taking the order and clearing the slot happen in one critical section,
    /// so no two drivers can ever see the same order.
    pub fn claim(&self, driver: DriverId) -> Claim {
        let mut guard = self.lock();
        loop {
            if guard.clock >= self.run_limit {
                guard.drivers[driver].status = DriverStatus::Idle;
                self.wake_all();
                return Claim::Expired;
            }
            if let Some(order) = guard.slot.take() {
                guard.drivers[driver].status = DriverStatus::Busy;
                guard.record_claim(order.id);
                self.tick.notify_all();
                self.slot_empty.notify_all();
                return Claim::Order(order);
            }
            guard.drivers[driver].status = DriverStatus::Idle;
            if guard.run_end {
                self.tick.notify_all();
                self.slot_empty.notify_all();
                // Input is drained: sleep until the clock moves rather than spin.
                let observed = guard.clock;
                while guard.clock == observed && guard.slot.is_none() {
                    guard = self.wait(&self.slot_full, guard);
                }
                continue;
            }
            guard = self.wait(&self.slot_full, guard);
        }
    }

    /// Publish a driver's new position. Called only by that driver's thread.
    pub fn record_position(&self, driver: DriverId, position: Coordinate) {
        self.lock().drivers[driver].position = position;
    }

    /// Mark a delivery finished for `driver`.
    pub fn complete_delivery(&self, driver: DriverId) {
        let mut guard = self.lock();
        let entry = &mut guard.drivers[driver];
        entry.status = DriverStatus::Idle;
        entry.completed += 1;
    }

    /// Return `driver` to idle without counting a delivery.
    pub fn abandon_delivery(&self, driver: DriverId) {
        self.lock().drivers[driver].status = DriverStatus::Idle;
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let guard = self.lock();
        BoardSnapshot {
            clock: guard.clock,
            drivers: guard.drivers.clone(),
        }
    }

    pub fn duplicate_claim(&self) -> bool {
        self.lock().duplicate_claim
    }

    /// Sorted ids of every claimed order, when validation is enabled.
    pub fn claimed_orders(&self) -> Option<Vec<OrderId>> {
        let guard = self.lock();
        guard.claimed.as_ref().map(|claimed| {
            let mut ids: Vec<OrderId> = claimed.iter().copied().collect();
            ids.sort_unstable();
            ids
        })
    }

    #[cfg(test)]
    fn pending_order(&self) -> Option<Order> {
        self.lock().slot
    }
}
