//! Stack cache (§4.4, §4.14): a sliding window of equal-size banks over
//! the logical Java stack. Exactly one bank is the *active* bank,
//! directly addressable; its neighbours are *resident* with valid
//! (possibly dirty) contents. Crossing a bank edge triggers a rotation:
//! the core stalls, the farthest resident bank spills to main memory if
//! dirty, and the bank on the opposite edge is filled (or zero-initialised,
//! if the logical region has never been touched before).

use crate::memory::MainMemory;

struct Bank {
    /// Logical bank index this slot currently holds, or `None` if the
    /// slot has never been assigned.
    logical: Option<i64>,
    dirty: bool,
    data: Vec<i32>,
}

pub struct StackCache {
    bank_words: usize,
    mem_base: u32,
    banks: Vec<Bank>,
    /// Index into `banks` of the active (addressable) bank.
    active: usize,
    /// Highest logical bank index ever made resident. A bank above this
    /// has never been backed by main memory and must be zero-initialised
    /// rather than fetched (§4.14 "newly allocated region past the
    /// high-water mark").
    high_water_bank: i64,
}

impl StackCache {
    pub fn new(num_banks: usize, bank_words: usize, mem_base: u32) -> Self {
        assert!(num_banks >= 3, "stack cache needs at least 3 banks to slide");
        let mut banks = Vec::with_capacity(num_banks);
        for i in 0..num_banks {
            banks.push(Bank {
                logical: Some(i as i64),
                dirty: false,
                data: vec![0; bank_words],
            });
        }
        Self {
            bank_words,
            mem_base,
            banks,
            active: 0,
            high_water_bank: num_banks as i64 - 1,
        }
    }

    pub fn bank_words(&self) -> usize {
        self.bank_words
    }

    fn active_logical(&self) -> i64 {
        self.banks[self.active].logical.unwrap()
    }

    fn bank_addr(&self, logical_bank: i64) -> u32 {
        self.mem_base + (logical_bank as u32) * self.bank_words as u32
    }

    fn logical_bank_of(&self, logical_addr: u32) -> i64 {
        (logical_addr / self.bank_words as u32) as i64
    }

    /// Read a word at a logical stack address within the active bank.
    /// Panics if `logical_addr` falls outside the active bank — callers
    /// must `ensure_resident` (triggering a rotation) first.
    pub fn read(&self, logical_addr: u32) -> i32 {
        let offset = (logical_addr % self.bank_words as u32) as usize;
        debug_assert_eq!(self.logical_bank_of(logical_addr), self.active_logical());
        self.banks[self.active].data[offset]
    }

    pub fn write(&mut self, logical_addr: u32, value: i32) {
        let offset = (logical_addr % self.bank_words as u32) as usize;
        debug_assert_eq!(self.logical_bank_of(logical_addr), self.active_logical());
        self.banks[self.active].data[offset] = value;
        self.banks[self.active].dirty = true;
    }

    pub fn is_resident(&self, logical_addr: u32) -> bool {
        self.logical_bank_of(logical_addr) == self.active_logical()
    }

    /// Rotate the window by one bank in the direction of `logical_addr`
    /// until it becomes the active bank. Each single-bank slide spills
    /// the bank on the trailing edge (if dirty) and fills/zero-inits the
    /// bank on the leading edge, matching the hardware's one-write-port/
    /// one-read-port bank RAM moving a single edge at a time.
    pub fn ensure_resident(&mut self, logical_addr: u32, mem: &mut MainMemory) {
        let target = self.logical_bank_of(logical_addr);
        while target != self.active_logical() {
            if target > self.active_logical() {
                self.slide_forward(mem);
            } else {
                self.slide_backward(mem);
            }
        }
    }

    /// Window `[L, L+n-1]` becomes `[L+1, L+n]`: the bottom bank (`L`,
    /// physically at `active`) falls out and is repurposed to hold the
    /// new top (`L+n`); the new active bank is the one already holding
    /// `L+1`.
    fn slide_forward(&mut self, mem: &mut MainMemory) {
        let n = self.banks.len();
        let evicted = self.active;
        self.spill_if_dirty(evicted, mem);
        let new_logical = self.active_logical() + n as i64;
        self.fill_or_zero(evicted, new_logical, mem);
        self.active = (self.active + 1) % n;
    }

    /// Window `[L, L+n-1]` becomes `[L-1, L+n-2]`: the top bank
    /// (`L+n-1`, physically at `active+n-1`) falls out and is repurposed
    /// to hold the new bottom (`L-1`), which also becomes the new active
    /// bank.
    fn slide_backward(&mut self, mem: &mut MainMemory) {
        let n = self.banks.len();
        let evicted = (self.active + n - 1) % n;
        self.spill_if_dirty(evicted, mem);
        let new_logical = self.active_logical() - 1;
        self.fill_or_zero(evicted, new_logical, mem);
        self.active = evicted;
    }

    fn spill_if_dirty(&mut self, bank_idx: usize, mem: &mut MainMemory) {
        let bank = &self.banks[bank_idx];
        if bank.dirty {
            if let Some(logical) = bank.logical {
                let addr = self.bank_addr(logical);
                mem.write_block(addr, &bank.data.iter().map(|&v| v as u32).collect::<Vec<_>>());
            }
        }
    }

    fn fill_or_zero(&mut self, bank_idx: usize, new_logical: i64, mem: &mut MainMemory) {
        let bank_words = self.bank_words;
        if new_logical > self.high_water_bank {
            self.high_water_bank = new_logical;
            self.banks[bank_idx].data = vec![0; bank_words];
        } else {
            let addr = self.bank_addr(new_logical);
            let words = mem.read_block(addr, bank_words as u32);
            self.banks[bank_idx].data = words.into_iter().map(|w| w as i32).collect();
        }
        self.banks[bank_idx].logical = Some(new_logical);
        self.banks[bank_idx].dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemTiming;

    #[test]
    fn read_write_within_active_bank() {
        let mut sc = StackCache::new(4, 4, 0);
        sc.write(1, 42);
        assert_eq!(sc.read(1), 42);
    }

    #[test]
    fn rotation_into_unallocated_region_zero_initialises() {
        let mut mem = MainMemory::new(64, MemTiming::Bram);
        let mut sc = StackCache::new(3, 4, 0);
        // Bank 3 (words 12-15) has never been touched.
        sc.ensure_resident(12, &mut mem);
        assert_eq!(sc.read(12), 0);
    }

    #[test]
    fn dirty_bank_spills_on_rotation_and_refills_correctly() {
        let mut mem = MainMemory::new(64, MemTiming::Bram);
        let mut sc = StackCache::new(3, 4, 0);
        sc.write(0, 99);
        sc.ensure_resident(8, &mut mem); // slide forward past bank 1 into bank 2
        sc.ensure_resident(0, &mut mem); // slide back; bank 0 must be refetched intact
        assert_eq!(sc.read(0), 99);
    }
}
