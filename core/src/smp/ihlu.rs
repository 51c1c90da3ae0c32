//! Individual Hardware Lock Unit (§4.12, optional alternative to
//! `CmpSync`): a fully-associative lock table with `K` slots, keyed on a
//! 32-bit value (typically a handle). Each slot tracks its owner, a
//! reentrancy counter, and a FIFO of waiting core ids.
//!
//! The real unit serves one core per 4-cycle window (IDLE -> RAM_READ ->
//! RAM_DELAY -> EXECUTE) in round robin; that scheduling detail is purely
//! a latency model this functional layer does not need to reproduce cycle
//! for cycle — callers observe the same lock/unlock outcomes regardless
//! of how many cycles the real hardware would have taken to produce them.

use crate::runtime::monitor::{LockFabric, LockOutcome};
use std::collections::VecDeque;

struct Slot {
    key: u32,
    owner: usize,
    reentrancy: u32,
    queue: VecDeque<usize>,
}

pub struct Ihlu {
    slots: Vec<Option<Slot>>,
}

impl Ihlu {
    pub fn new(num_slots: usize) -> Self {
        Self {
            slots: (0..num_slots).map(|_| None).collect(),
        }
    }

    fn find_slot(&self, key: u32) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(slot) if slot.key == key))
    }

    fn free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    /// Drain rule (§4.12 "GC-halt interaction"): exempt from GC-halt iff
    /// this core currently owns at least one slot.
    pub fn holds_any_lock(&self, core_id: usize) -> bool {
        self.slots
            .iter()
            .any(|s| matches!(s, Some(slot) if slot.owner == core_id))
    }
}

impl LockFabric for Ihlu {
    fn try_lock(&mut self, core_id: usize, key: u32) -> LockOutcome {
        if let Some(idx) = self.find_slot(key) {
            let slot = self.slots[idx].as_mut().unwrap();
            if slot.owner == core_id {
                slot.reentrancy += 1;
                return LockOutcome::Granted;
            }
            if !slot.queue.contains(&core_id) {
                slot.queue.push_back(core_id);
            }
            return LockOutcome::Queued;
        }
        match self.free_slot() {
            Some(idx) => {
                self.slots[idx] = Some(Slot {
                    key,
                    owner: core_id,
                    reentrancy: 1,
                    queue: VecDeque::new(),
                });
                LockOutcome::Granted
            }
            None => LockOutcome::Full,
        }
    }

    fn unlock(&mut self, core_id: usize, key: u32) {
        let Some(idx) = self.find_slot(key) else {
            return;
        };
        let slot = self.slots[idx].as_mut().unwrap();
        if slot.owner != core_id {
            return;
        }
        if slot.reentrancy > 0 {
            slot.reentrancy -= 1;
        }
        if slot.reentrancy == 0 {
            if let Some(next) = slot.queue.pop_front() {
                slot.owner = next;
                slot.reentrancy = 1;
            } else {
                self.slots[idx] = None;
            }
        }
    }
}
