//! Array cache (A$, §4.8): fully-associative, 16 entries x 4 elements.
//! Tag is `{handle, index >> 2}` so distinct 4-element regions of one
//! array occupy different lines. A per-line `filling` flag plus a
//! `invalidated_while_filling` flag implement the snoop-during-fill guard:
//! a snoop that arrives mid-fill must prevent the fill from marking the
//! line valid once it completes.

pub const ELEMENTS_PER_LINE: usize = 4;

#[derive(Clone, Debug)]
struct Entry {
    handle: u32,
    index_upper: u32,
    occupied: bool,
    valid: bool,
    filling: bool,
    invalidated_while_filling: bool,
    data: [i32; ELEMENTS_PER_LINE],
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            handle: 0,
            index_upper: 0,
            occupied: false,
            valid: false,
            filling: false,
            invalidated_while_filling: false,
            data: [0; ELEMENTS_PER_LINE],
        }
    }
}

fn line_of(index: u32) -> u32 {
    index / ELEMENTS_PER_LINE as u32
}

pub struct ArrayCache {
    entries: Vec<Entry>,
    fifo_ptr: usize,
}

impl ArrayCache {
    pub fn new(num_entries: usize) -> Self {
        Self {
            entries: vec![Entry::default(); num_entries],
            fifo_ptr: 0,
        }
    }

    pub fn lookup(&self, handle: u32, index: u32) -> Option<i32> {
        let upper = line_of(index);
        self.entries
            .iter()
            .find(|e| e.occupied && e.valid && e.handle == handle && e.index_upper == upper)
            .map(|e| e.data[(index % ELEMENTS_PER_LINE as u32) as usize])
    }

    /// Begin a fill for the line covering `index`, evicting a FIFO entry.
    /// Returns the entry index so the caller can later call
    /// `complete_fill` once the burst/4-word read finishes.
    pub fn begin_fill(&mut self, handle: u32, index: u32) -> usize {
        let upper = line_of(index);
        let idx = self.fifo_ptr;
        self.entries[idx] = Entry {
            handle,
            index_upper: upper,
            occupied: true,
            valid: false,
            filling: true,
            invalidated_while_filling: false,
            data: [0; ELEMENTS_PER_LINE],
        };
        self.fifo_ptr = (self.fifo_ptr + 1) % self.entries.len();
        idx
    }

    /// Complete a fill started with `begin_fill`. The line becomes valid
    /// unless a snoop invalidated it while the fill was in flight.
    pub fn complete_fill(&mut self, entry_idx: usize, data: [i32; ELEMENTS_PER_LINE]) {
        let e = &mut self.entries[entry_idx];
        e.data = data;
        e.filling = false;
        e.valid = !e.invalidated_while_filling;
        e.invalidated_while_filling = false;
    }

    /// Write-through on hit.
    pub fn store(&mut self, handle: u32, index: u32, value: i32) -> bool {
        let upper = line_of(index);
        if let Some(e) = self
            .entries
            .iter_mut()
            .find(|e| e.occupied && e.valid && e.handle == handle && e.index_upper == upper)
        {
            e.data[(index % ELEMENTS_PER_LINE as u32) as usize] = value;
            true
        } else {
            false
        }
    }

    pub fn invalidate_all(&mut self) {
        for e in &mut self.entries {
            e.occupied = false;
            e.valid = false;
            e.filling = false;
        }
    }

    /// Snoop invalidation for the line covering `index`. If the line is
    /// currently mid-fill, the invalidation is deferred via
    /// `invalidated_while_filling` rather than applied immediately, so a
    /// fill that is already in flight cannot resurrect stale data.
    pub fn snoop_invalidate(&mut self, handle: u32, index: u32) {
        let upper = line_of(index);
        if let Some(e) = self
            .entries
            .iter_mut()
            .find(|e| e.occupied && e.handle == handle && e.index_upper == upper)
        {
            if e.filling {
                e.invalidated_while_filling = true;
            } else {
                e.valid = false;
            }
        }
    }

    pub fn invalidate_handle(&mut self, handle: u32) {
        for e in &mut self.entries {
            if e.occupied && e.handle == handle {
                if e.filling {
                    e.invalidated_while_filling = true;
                } else {
                    e.valid = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_then_hit() {
        let mut ac = ArrayCache::new(16);
        let idx = ac.begin_fill(5, 6);
        ac.complete_fill(idx, [10, 11, 12, 13]);
        assert_eq!(ac.lookup(5, 6), Some(12));
        assert_eq!(ac.lookup(5, 4), Some(10));
    }

    #[test]
    fn snoop_during_fill_suppresses_validity() {
        let mut ac = ArrayCache::new(16);
        let idx = ac.begin_fill(5, 0);
        ac.snoop_invalidate(5, 1); // same line, arrives mid-fill
        ac.complete_fill(idx, [1, 2, 3, 4]);
        assert_eq!(ac.lookup(5, 0), None);
    }

    #[test]
    fn store_write_through_on_hit() {
        let mut ac = ArrayCache::new(16);
        let idx = ac.begin_fill(5, 0);
        ac.complete_fill(idx, [0, 0, 0, 0]);
        assert!(ac.store(5, 2, 99));
        assert_eq!(ac.lookup(5, 2), Some(99));
    }

    #[test]
    fn different_regions_of_same_array_occupy_different_lines() {
        let mut ac = ArrayCache::new(16);
        let idx0 = ac.begin_fill(5, 0);
        ac.complete_fill(idx0, [1, 2, 3, 4]);
        assert_eq!(ac.lookup(5, 4), None); // different line, not resident
    }
}
