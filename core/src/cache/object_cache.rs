//! Object cache (O$, §4.7): fully-associative, 16 entries x 8 fields.
//! Getfield hits resolve combinationally (zero busy cycles); misses fall
//! through to the handle path. Putfield always runs the memory controller
//! and writes through on hit. Only field indices 0-7 are cacheable.

pub const FIELDS_PER_ENTRY: usize = 8;

#[derive(Clone, Debug)]
struct Entry {
    handle: u32,
    occupied: bool,
    valid: [bool; FIELDS_PER_ENTRY],
    data: [i32; FIELDS_PER_ENTRY],
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            handle: 0,
            occupied: false,
            valid: [false; FIELDS_PER_ENTRY],
            data: [0; FIELDS_PER_ENTRY],
        }
    }
}

pub struct ObjectCache {
    entries: Vec<Entry>,
    fifo_ptr: usize,
}

impl ObjectCache {
    pub fn new(num_entries: usize) -> Self {
        Self {
            entries: vec![Entry::default(); num_entries],
            fifo_ptr: 0,
        }
    }

    pub fn is_cacheable(field_index: u32) -> bool {
        (field_index as usize) < FIELDS_PER_ENTRY
    }

    pub fn lookup(&self, handle: u32, field_index: u32) -> Option<i32> {
        if !Self::is_cacheable(field_index) {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.occupied && e.handle == handle)
            .and_then(|e| {
                let f = field_index as usize;
                e.valid[f].then_some(e.data[f])
            })
    }

    /// Fill one field's value after a handle-path read on a miss,
    /// allocating a FIFO entry for the handle if it is not already
    /// resident.
    pub fn fill(&mut self, handle: u32, field_index: u32, value: i32) {
        if !Self::is_cacheable(field_index) {
            return;
        }
        let idx = self.entry_for(handle);
        let e = &mut self.entries[idx];
        e.valid[field_index as usize] = true;
        e.data[field_index as usize] = value;
    }

    /// Write-through on hit. Returns true if the entry existed and was
    /// updated.
    pub fn store(&mut self, handle: u32, field_index: u32, value: i32) -> bool {
        if !Self::is_cacheable(field_index) {
            return false;
        }
        if let Some(e) = self
            .entries
            .iter_mut()
            .find(|e| e.occupied && e.handle == handle)
        {
            let f = field_index as usize;
            e.valid[f] = true;
            e.data[f] = value;
            true
        } else {
            false
        }
    }

    fn entry_for(&mut self, handle: u32) -> usize {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|e| e.occupied && e.handle == handle)
        {
            return idx;
        }
        let idx = self.fifo_ptr;
        self.entries[idx] = Entry {
            handle,
            occupied: true,
            ..Default::default()
        };
        self.fifo_ptr = (self.fifo_ptr + 1) % self.entries.len();
        idx
    }

    /// `stidx`/`cinval`: clear all valid bits locally.
    pub fn invalidate_all(&mut self) {
        for e in &mut self.entries {
            e.occupied = false;
            e.valid = [false; FIELDS_PER_ENTRY];
        }
    }

    /// Snoop invalidation from a remote core's putfield (§4.13). Clears
    /// only the matching `{handle, field}` entry; never stalls.
    pub fn snoop_invalidate(&mut self, handle: u32, field_index: u32) {
        if !Self::is_cacheable(field_index) {
            return;
        }
        if let Some(e) = self
            .entries
            .iter_mut()
            .find(|e| e.occupied && e.handle == handle)
        {
            e.valid[field_index as usize] = false;
        }
    }

    /// Bulk writes (`System.arraycopy`-style raw memory copies) bypass
    /// putfield and must be followed by an explicit invalidation of the
    /// whole handle, since no single field index applies.
    pub fn invalidate_handle(&mut self, handle: u32) {
        if let Some(e) = self
            .entries
            .iter_mut()
            .find(|e| e.occupied && e.handle == handle)
        {
            e.valid = [false; FIELDS_PER_ENTRY];
        }
    }
}
